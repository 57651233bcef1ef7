mod chromosome;
mod data;
mod engine;
mod fitness;
mod sample;
mod server;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    server::run_server().await;
}
