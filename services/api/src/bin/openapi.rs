//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3.0 document for the benchmark routes: the four
//! `POST /test/{store}/users/...` operations, the `count` request body of the
//! insert route and the shared `{operation, database, duration}` response.
//!
//! Usage: `openapi [OUTPUT]`, where `OUTPUT` defaults to `openapi.json`.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    std::fs::write(&path, ApiDoc::openapi().to_pretty_json()?)?;
    println!("OpenAPI document for the store benchmark written to {}", path);
    Ok(())
}
