use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    race_tally::cli::run_summarize(std::env::args().skip(1))
}
