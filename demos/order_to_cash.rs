//! Walks a sale, its load order and the resulting payment through their
//! lifecycles against a throwaway sled database.
//!
//! RUST_LOG=debug cargo run --example order_to_cash

use document_lifecycle::{
    DocumentType::{LoadOrder, Payment, Sale},
    LifecycleEngine, TransitionRequest,
    hooks::HookDispatcher,
    permission::GrantTable,
    service::DocumentService,
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // removed when `dir` drops, including on early error returns
    let dir = tempfile::tempdir()?;
    let db = Arc::new(sled::open(dir.path().join("order_to_cash.db"))?);
    let engine = Arc::new(LifecycleEngine::standard()?);

    // every hook just logs here; a real deployment posts to stock and ledger services
    let names = engine.catalog().hooks().names();
    let dispatcher = names.into_iter().fold(HookDispatcher::new(), |d, name| {
        let hook = name.to_string();
        d.register(name, move |ctx| {
            tracing::info!(hook = %hook, document_id = ctx.document_id, "running hook");
            Ok(())
        })
    });

    let grants = GrantTable::new()
        .grant("ana", "sales.confirm")
        .grant("ana", "sales.prepare")
        .grant("ana", "sales.close")
        .grant("bruno", "loadOrders.load")
        .grant("bruno", "loadOrders.dispatch")
        .grant("carla", "payments.confirm");

    let service = DocumentService::new(db, engine, grants, dispatcher)?;

    let sale = service.create_document(Sale, "ana")?;
    for (from, to) in [("BORRADOR", "CONFIRMADA"), ("CONFIRMADA", "EN_PREPARACION")] {
        service.transition(TransitionRequest::new(Sale, &sale.id, from, to, "ana"))?;
    }

    let order = service.create_document(LoadOrder, "bruno")?;
    for (from, to) in [
        ("PENDIENTE", "CARGANDO"),
        ("CARGANDO", "CARGADA"),
        ("CARGADA", "DESPACHADA"),
    ] {
        let outcome = service.transition(TransitionRequest::new(LoadOrder, &order.id, from, to, "bruno"))?;
        println!("{} {} -> {} hooks {:?}", order.id, from, to, outcome.result.hooks);
    }

    let payment = service.create_document(Payment, "carla")?;
    for (from, to) in [("BORRADOR", "PENDIENTE"), ("PENDIENTE", "CONFIRMADO")] {
        service.transition(TransitionRequest::new(Payment, &payment.id, from, to, "carla"))?;
    }

    // an illegal jump reports what would have been allowed
    if let Err(e) = service.transition(TransitionRequest::new(Sale, &sale.id, "EN_PREPARACION", "CERRADA", "ana")) {
        println!("rejected: {}", e);
    }

    for entry in service.history(&sale.id)? {
        println!(
            "v{} {} -> {} by {}",
            entry.version, entry.result.previous_state, entry.result.new_state, entry.request.user_id
        );
    }

    Ok(())
}
