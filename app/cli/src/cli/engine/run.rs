use alloy::rpc::types::Log;
use chain::rpc::NodeClient;
use engine::{
    args::Args,
    engine::Engine,
    live::sink::{event::EventSink, handle::Sink},
    live::source::{handle::Source, log::LogSource},
};
use eyre::Result;
use std::sync::Arc;
use store::{
    client::Client, cursor::store::Store as CursorStore, event::model::DomainEvent,
    event::store::Store as EventStore,
};

pub async fn start(node_client: NodeClient, db_url: &str, engine_args: Args) -> Result<()> {
    let source: Arc<dyn Source<Item = Log>> = Arc::new(LogSource { node_client });

    let client = Client::init(db_url).await?;
    let cursor_store = CursorStore::new(client.clone());
    let sink: Arc<dyn Sink<Item = DomainEvent>> =
        Arc::new(EventSink { store: EventStore::new(client) });

    tracing::info!("Starting the engine {engine_args:?}");

    let engine = Engine::start(engine_args, source, cursor_store, sink).await?;
    let cancel = engine.cancellation_token();

    // Run until SIGINT or until the engine stops on its own
    let wait = engine.wait();
    tokio::pin!(wait);
    tokio::select! {
        result = &mut wait => {
            if let Err(e) = &result {
                tracing::error!("Engine stopped: {e:?}");
            }
            result
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down engine...");
            cancel.cancel();
            wait.await
        }
    }
}
