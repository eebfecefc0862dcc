fn main() {
    let addr = std::env::var("COTIZADOR_SERVICE_ADDR")
        .unwrap_or_else(|_| cotizador_service::DEFAULT_ADDR.to_string());
    println!("cotizador-service listening on {addr}");
    if let Err(err) = cotizador_service::start_server(&addr) {
        eprintln!("service stopped: {err}");
        std::process::exit(1);
    }
}
