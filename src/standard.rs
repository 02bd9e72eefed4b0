//! Built-in order-to-cash rule set
use super::catalog::{Catalog, CatalogBuilder};
use super::document::DocumentType::{Delivery, Invoice, LoadOrder, Payment, Remito, Sale};
use super::registry::StateGraph;

pub(crate) fn catalog() -> Catalog {
    let builder = CatalogBuilder::new();
    let builder = sale(builder);
    let builder = load_order(builder);
    let builder = delivery(builder);
    let builder = remito(builder);
    let builder = invoice(builder);
    payment(builder).finish()
}

fn sale(b: CatalogBuilder) -> CatalogBuilder {
    let graph = StateGraph::new("BORRADOR")
        .state("BORRADOR", &["CONFIRMADA", "CANCELADA"])
        .state("CONFIRMADA", &["EN_PREPARACION", "CANCELADA"])
        .state("EN_PREPARACION", &["PARCIALMENTE_ENTREGADA", "ENTREGADA", "CANCELADA"])
        // successive partial deliveries
        .state("PARCIALMENTE_ENTREGADA", &["PARCIALMENTE_ENTREGADA", "ENTREGADA"])
        .state("ENTREGADA", &["PARCIALMENTE_FACTURADA", "FACTURADA"])
        .state("PARCIALMENTE_FACTURADA", &["FACTURADA"])
        .state("FACTURADA", &["CERRADA"])
        .state("CERRADA", &[])
        .cancel_state("CANCELADA", &[]);

    b.graph(Sale, graph)
        .permission(Sale, "BORRADOR", "CONFIRMADA", "sales.confirm")
        .permission(Sale, "BORRADOR", "CANCELADA", "sales.cancel")
        .permission(Sale, "CONFIRMADA", "EN_PREPARACION", "sales.prepare")
        .permission(Sale, "CONFIRMADA", "CANCELADA", "sales.cancel")
        .permission(Sale, "EN_PREPARACION", "CANCELADA", "sales.cancel")
        .permission(Sale, "FACTURADA", "CERRADA", "sales.close")
        .hooks(Sale, "BORRADOR", "CONFIRMADA", &["reserveStock"])
        .hooks(Sale, "CONFIRMADA", "EN_PREPARACION", &["createLoadOrder"])
        .hooks(Sale, "CONFIRMADA", "CANCELADA", &["releaseStock"])
        .hooks(Sale, "EN_PREPARACION", "CANCELADA", &["releaseStock", "cancelLoadOrders"])
        .hooks(Sale, "EN_PREPARACION", "PARCIALMENTE_ENTREGADA", &["updateDeliveredQty"])
        .hooks(Sale, "EN_PREPARACION", "ENTREGADA", &["updateDeliveredQty"])
        .hooks(Sale, "PARCIALMENTE_ENTREGADA", "PARCIALMENTE_ENTREGADA", &["updateDeliveredQty"])
        .hooks(Sale, "PARCIALMENTE_ENTREGADA", "ENTREGADA", &["updateDeliveredQty"])
        .hooks(Sale, "ENTREGADA", "PARCIALMENTE_FACTURADA", &["updateInvoicedQty"])
        .hooks(Sale, "ENTREGADA", "FACTURADA", &["updateInvoicedQty"])
        .hooks(Sale, "PARCIALMENTE_FACTURADA", "FACTURADA", &["updateInvoicedQty"])
}

fn load_order(b: CatalogBuilder) -> CatalogBuilder {
    let graph = StateGraph::new("PENDIENTE")
        .state("PENDIENTE", &["CARGANDO", "CANCELADA"])
        .state("CARGANDO", &["CARGADA", "CANCELADA"])
        .state("CARGADA", &["DESPACHADA"])
        .state("DESPACHADA", &[])
        .cancel_state("CANCELADA", &[]);

    b.graph(LoadOrder, graph)
        .permission(LoadOrder, "PENDIENTE", "CARGANDO", "loadOrders.load")
        .permission(LoadOrder, "CARGANDO", "CARGADA", "loadOrders.load")
        .permission(LoadOrder, "CARGADA", "DESPACHADA", "loadOrders.dispatch")
        .permission(LoadOrder, "PENDIENTE", "CANCELADA", "loadOrders.cancel")
        .permission(LoadOrder, "CARGANDO", "CANCELADA", "loadOrders.cancel")
        .hooks(
            LoadOrder,
            "CARGANDO",
            "CARGADA",
            &["updateLoadedQty", "emitRemito", "decrementStock", "maybeEmitInvoice"],
        )
        .hooks(LoadOrder, "CARGADA", "DESPACHADA", &["createDelivery"])
        .hooks(LoadOrder, "CARGANDO", "CANCELADA", &["releaseStock"])
}

fn delivery(b: CatalogBuilder) -> CatalogBuilder {
    let graph = StateGraph::new("PENDIENTE")
        .state("PENDIENTE", &["EN_TRANSITO", "CANCELADA"])
        .state("EN_TRANSITO", &["ENTREGADA", "ENTREGA_FALLIDA"])
        // redelivery after a failed attempt
        .state("ENTREGA_FALLIDA", &["EN_TRANSITO", "CANCELADA"])
        .state("ENTREGADA", &[])
        .cancel_state("CANCELADA", &[]);

    b.graph(Delivery, graph)
        .permission(Delivery, "PENDIENTE", "EN_TRANSITO", "deliveries.dispatch")
        .permission(Delivery, "ENTREGA_FALLIDA", "EN_TRANSITO", "deliveries.dispatch")
        .permission(Delivery, "EN_TRANSITO", "ENTREGADA", "deliveries.confirm")
        .permission(Delivery, "EN_TRANSITO", "ENTREGA_FALLIDA", "deliveries.confirm")
        .permission(Delivery, "PENDIENTE", "CANCELADA", "deliveries.cancel")
        .permission(Delivery, "ENTREGA_FALLIDA", "CANCELADA", "deliveries.cancel")
        .hooks(Delivery, "PENDIENTE", "EN_TRANSITO", &["notifyCustomer"])
        .hooks(Delivery, "ENTREGA_FALLIDA", "EN_TRANSITO", &["notifyCustomer"])
        .hooks(
            Delivery,
            "EN_TRANSITO",
            "ENTREGADA",
            &["markRemitoDelivered", "updateSaleDelivery"],
        )
        .hooks(Delivery, "EN_TRANSITO", "ENTREGA_FALLIDA", &["notifyCustomer"])
}

fn remito(b: CatalogBuilder) -> CatalogBuilder {
    let graph = StateGraph::new("BORRADOR")
        .state("BORRADOR", &["PREPARADO", "ANULADO"])
        .state("PREPARADO", &["EMITIDO", "ANULADO"])
        .state("EMITIDO", &["ENTREGADO", "ANULADO"])
        .state("ENTREGADO", &[])
        .cancel_state("ANULADO", &[]);

    b.graph(Remito, graph)
        .permission(Remito, "PREPARADO", "EMITIDO", "remitos.emit")
        .permission(Remito, "BORRADOR", "ANULADO", "remitos.void")
        .permission(Remito, "PREPARADO", "ANULADO", "remitos.void")
        .permission(Remito, "EMITIDO", "ANULADO", "remitos.void")
        .hooks(Remito, "PREPARADO", "EMITIDO", &["assignNumber", "decrementStock"])
        .hooks(Remito, "EMITIDO", "ANULADO", &["restoreStock"])
}

fn invoice(b: CatalogBuilder) -> CatalogBuilder {
    let graph = StateGraph::new("BORRADOR")
        .state("BORRADOR", &["EMITIDA", "ANULADA"])
        .state("EMITIDA", &["PARCIALMENTE_PAGADA", "PAGADA", "VENCIDA", "ANULADA"])
        // successive partial payments
        .state("PARCIALMENTE_PAGADA", &["PARCIALMENTE_PAGADA", "PAGADA", "VENCIDA"])
        .state("VENCIDA", &["PARCIALMENTE_PAGADA", "PAGADA"])
        .state("PAGADA", &[])
        .cancel_state("ANULADA", &[]);

    b.graph(Invoice, graph)
        .permission(Invoice, "BORRADOR", "EMITIDA", "invoices.emit")
        .permission(Invoice, "BORRADOR", "ANULADA", "invoices.void")
        .permission(Invoice, "EMITIDA", "ANULADA", "invoices.void")
        .hooks(
            Invoice,
            "BORRADOR",
            "EMITIDA",
            &["assignNumber", "createLedgerEntry", "updateSaleInvoicing"],
        )
        .hooks(Invoice, "EMITIDA", "ANULADA", &["reverseLedgerEntry", "updateSaleInvoicing"])
        .hooks(Invoice, "EMITIDA", "VENCIDA", &["notifyOverdue"])
        .hooks(Invoice, "PARCIALMENTE_PAGADA", "VENCIDA", &["notifyOverdue"])
}

fn payment(b: CatalogBuilder) -> CatalogBuilder {
    let graph = StateGraph::new("BORRADOR")
        .state("BORRADOR", &["PENDIENTE", "ANULADO"])
        .state("PENDIENTE", &["CONFIRMADO", "RECHAZADO", "ANULADO"])
        .state("CONFIRMADO", &["ANULADO"])
        .state("RECHAZADO", &[])
        .cancel_state("ANULADO", &[]);

    b.graph(Payment, graph)
        .permission(Payment, "PENDIENTE", "CONFIRMADO", "payments.confirm")
        .permission(Payment, "PENDIENTE", "RECHAZADO", "payments.confirm")
        .permission(Payment, "BORRADOR", "ANULADO", "payments.void")
        .permission(Payment, "PENDIENTE", "ANULADO", "payments.void")
        .permission(Payment, "CONFIRMADO", "ANULADO", "payments.void")
        .hooks(Payment, "PENDIENTE", "CONFIRMADO", &["createLedgerEntry", "applyToInvoices"])
        .hooks(
            Payment,
            "CONFIRMADO",
            "ANULADO",
            &["reverseLedgerEntry", "unapplyFromInvoices"],
        )
}
