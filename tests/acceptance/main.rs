use cucumber::World;
use std::process::ExitStatus;

#[derive(Debug, Default, World)]
pub struct IssuedagWorld {
    pub captured_output: Vec<u8>,
    pub captured_error: Vec<u8>,
    pub command_status: Option<ExitStatus>,
    pub workdir: Option<tempfile::TempDir>,
}

#[tokio::main]
async fn main() {
    IssuedagWorld::run("features").await;
}

mod steps;
