use std::process::ExitCode;

use aesbatch::app::App;
use aesbatch::ui::show_error;
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let result = match App::init() {
        Ok(app) => app.execute().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            show_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
