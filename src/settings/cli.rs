use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tessera", about = "Session token authority")]
pub struct Cli {
    /// Path of the settings file.
    #[arg(long)]
    pub settings: Option<String>,
}
