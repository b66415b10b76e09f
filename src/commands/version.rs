use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("smartbin version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
