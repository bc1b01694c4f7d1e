/*
 * Responsibility
 * - Start the tokio runtime
 * - Call app::run() (no logic here)
 */
use origin_gate::{app, error::AppError};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    app::run().await
}
