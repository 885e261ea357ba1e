use clap::Parser;

/// Initialise logging and parse the command line for a scenario.
pub fn init<C: Parser>() -> C {
    env_logger::init();

    C::parse()
}
