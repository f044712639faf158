use anyhow::Result;

fn main() -> Result<()> {
    rawguard::cli::run()
}
