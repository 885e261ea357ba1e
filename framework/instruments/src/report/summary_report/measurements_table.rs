use tabled::Tabled;

#[derive(Tabled)]
pub struct MeasurementSummaryRow {
    pub num_consumers: usize,
    pub action: String,
    pub event: String,
    pub count: usize,
    #[tabled(display = "float3")]
    pub avg_s: f64,
    #[tabled(display = "float3")]
    pub min_s: f64,
    #[tabled(display = "float3")]
    pub max_s: f64,
}

fn float3(n: &f64) -> String {
    format!("{:.3}", n)
}
