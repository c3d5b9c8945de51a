//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3 document served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::handlers::{
    HealthResponse, QuerySignature, ReadyResponse, SearchHit, SearchJsonRequest, SearchResponse,
    VectorSearchRequest, VectorSearchResponse,
};

/// Vistazo API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vistazo - Visual Search API",
        version = "0.1.0",
        description = r#"
## Visual similarity search for product catalogs

Send a photo, get back the catalog products that look most like it.

- **Perceptual hashes** - 64-bit DCT and average hashes, robust to re-encoding and resizing
- **Dominant color** - background-suppressed garment color with a saturation-aware distance
- **Gates** - hue and black/white checks keep look-alike shapes in the wrong color out
- **Vector search** - optional external embedding index, with a local fallback

### Presets

| Preset | Use |
|--------|-----|
| `strict` | Default. Tight threshold, all gates on |
| `permissive` | Wider threshold, tone gate only |
| `vertex-fallback` | Used when the vector service is unavailable |
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Search", description = "Similarity search against the local index"),
        (name = "Vector Search", description = "Nearest neighbors for externally computed embeddings"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::search::search_handler,
        crate::handlers::search::search_json_handler,
        crate::handlers::vector::vector_search_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            SearchJsonRequest,
            SearchResponse,
            SearchHit,
            QuerySignature,
            VectorSearchRequest,
            VectorSearchResponse,
        )
    )
)]
pub struct ApiDoc;
