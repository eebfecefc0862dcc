pub(crate) mod backend_router;
mod backend_runtime;
mod headers;
mod proxy_bridge;
mod proxy_runtime;
pub(crate) mod server;
