//! Smoke tests for the standard order-to-cash catalog
//!
//! These exercise the public engine surface against the built-in tables,
//! one document type at a time, and pin down the concrete scenarios the
//! downstream services rely on.

use document_lifecycle::{
    DocumentType::{self, Delivery, Invoice, LoadOrder, Payment, Remito, Sale},
    LifecycleEngine, LifecycleError, TransitionRequest,
};

fn engine() -> LifecycleEngine {
    LifecycleEngine::standard().expect("standard catalog verifies")
}

// CONCRETE SCENARIOS
#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn sale_confirmation_is_valid_and_needs_sales_confirm() {
        let engine = engine();
        assert!(engine.is_valid_transition(Sale, "BORRADOR", "CONFIRMADA"));
        assert_eq!(
            engine.transition_permission(Sale, "BORRADOR", "CONFIRMADA"),
            Some("sales.confirm")
        );

        let request = TransitionRequest::new(Sale, "sale_1", "BORRADOR", "CONFIRMADA", "user_1");
        let validation = engine.validate_transition(&request).unwrap();
        assert!(validation.valid);
        assert_eq!(validation.permission.as_deref(), Some("sales.confirm"));
    }

    #[test]
    fn skipping_to_invoiced_lists_alternatives() {
        let engine = engine();
        assert!(!engine.is_valid_transition(Sale, "BORRADOR", "FACTURADA"));

        let request = TransitionRequest::new(Sale, "sale_1", "BORRADOR", "FACTURADA", "user_1");
        let validation = engine.validate_transition(&request).unwrap();

        assert!(!validation.valid);
        assert_eq!(validation.permission, None);
        assert_eq!(validation.allowed_states(), ["CONFIRMADA", "CANCELADA"]);
        assert!(
            validation
                .error_message()
                .unwrap()
                .contains("Estados permitidos: CONFIRMADA, CANCELADA")
        );
    }

    #[test]
    fn loading_complete_hooks_run_in_declared_order() {
        assert_eq!(
            engine().transition_hooks(LoadOrder, "CARGANDO", "CARGADA"),
            ["updateLoadedQty", "emitRemito", "decrementStock", "maybeEmitInvoice"]
        );
    }

    #[test]
    fn payment_terminal_states() {
        let engine = engine();
        assert!(engine.is_terminal_state(Payment, "ANULADO"));
        assert!(!engine.is_terminal_state(Payment, "CONFIRMADO"));
    }

    #[test]
    fn delivery_cancellability() {
        let engine = engine();
        assert!(engine.is_cancellable(Delivery, "PENDIENTE"));
        assert!(!engine.is_cancellable(Delivery, "ENTREGADA"));
    }

    #[test]
    fn remito_starts_in_draft() {
        let engine = engine();
        assert_eq!(engine.initial_state(Remito), Ok("BORRADOR"));
        assert!(engine.is_valid_transition(Remito, "BORRADOR", "PREPARADO"));
    }
}

// PER DOCUMENT TYPE
#[cfg(test)]
mod graphs {
    use super::*;

    #[test]
    fn sale_closed_and_cancelled_are_terminal() {
        let engine = engine();
        assert!(engine.is_terminal_state(Sale, "CERRADA"));
        assert!(engine.is_terminal_state(Sale, "CANCELADA"));
        assert!(engine.allowed_transitions(Sale, "CERRADA").is_empty());
    }

    #[test]
    fn partial_delivery_self_loops() {
        let engine = engine();
        assert!(engine.is_valid_transition(
            Sale,
            "PARCIALMENTE_ENTREGADA",
            "PARCIALMENTE_ENTREGADA"
        ));
        // once delivery started the sale can no longer be cancelled
        assert!(!engine.is_cancellable(Sale, "PARCIALMENTE_ENTREGADA"));
        assert!(engine.is_cancellable(Sale, "EN_PREPARACION"));
    }

    #[test]
    fn failed_delivery_can_be_retried() {
        let engine = engine();
        assert!(engine.is_valid_transition(Delivery, "EN_TRANSITO", "ENTREGA_FALLIDA"));
        assert!(engine.is_valid_transition(Delivery, "ENTREGA_FALLIDA", "EN_TRANSITO"));
        assert!(!engine.is_valid_transition(Delivery, "ENTREGADA", "EN_TRANSITO"));
    }

    #[test]
    fn remito_emission_numbers_before_moving_stock() {
        let hooks = engine().transition_hooks(Remito, "PREPARADO", "EMITIDO").to_vec();
        let number = hooks.iter().position(|h| h == "assignNumber").unwrap();
        let stock = hooks.iter().position(|h| h == "decrementStock").unwrap();
        assert!(number < stock);
    }

    #[test]
    fn invoice_partial_payments_self_loop() {
        let engine = engine();
        assert!(engine.is_valid_transition(Invoice, "PARCIALMENTE_PAGADA", "PARCIALMENTE_PAGADA"));
        assert!(engine.is_valid_transition(Invoice, "VENCIDA", "PAGADA"));
        assert!(!engine.is_cancellable(Invoice, "VENCIDA"));
    }

    #[test]
    fn draft_is_shared_by_name_only() {
        let engine = engine();
        // BORRADOR exists in several types with different exits
        assert!(engine.is_valid_transition(Sale, "BORRADOR", "CONFIRMADA"));
        assert!(!engine.is_valid_transition(Invoice, "BORRADOR", "CONFIRMADA"));
        assert!(engine.is_valid_transition(Invoice, "BORRADOR", "EMITIDA"));
    }

    #[test]
    fn edges_without_entries_need_no_permission_or_hooks() {
        let engine = engine();
        assert_eq!(engine.transition_permission(Remito, "BORRADOR", "PREPARADO"), None);
        assert!(engine.transition_hooks(Remito, "BORRADOR", "PREPARADO").is_empty());
    }

    #[test]
    fn initial_states() {
        let engine = engine();
        let expected = [
            (Sale, "BORRADOR"),
            (LoadOrder, "PENDIENTE"),
            (Delivery, "PENDIENTE"),
            (Remito, "BORRADOR"),
            (Invoice, "BORRADOR"),
            (Payment, "BORRADOR"),
        ];
        for (doc_type, state) in expected {
            assert_eq!(engine.initial_state(doc_type), Ok(state));
        }
    }
}

// REQUEST HANDLING
#[cfg(test)]
mod requests {
    use super::*;

    #[test]
    fn parse_then_validate() {
        let doc_type: DocumentType = "loadOrder".parse().unwrap();
        let request = TransitionRequest::new(doc_type, "lo_1", "PENDIENTE", "CARGANDO", "user_1");
        assert!(engine().validate_transition(&request).unwrap().valid);

        assert_eq!(
            "quote".parse::<DocumentType>(),
            Err(LifecycleError::UnknownDocumentType("quote".into()))
        );
    }

    #[test]
    fn void_needs_a_reason() {
        let engine = engine();
        let request = TransitionRequest::new(Payment, "pay_1", "CONFIRMADO", "ANULADO", "user_1");

        let validation = engine.validate_transition(&request).unwrap();
        assert!(!validation.valid);
        assert!(matches!(validation.error, Some(LifecycleError::ReasonRequired { .. })));

        let result = engine
            .plan(&request.with_reason("cheque rechazado por el banco"))
            .unwrap();
        assert!(result.success);
        assert_eq!(result.permission.as_deref(), Some("payments.void"));
        assert_eq!(result.hooks, ["reverseLedgerEntry", "unapplyFromInvoices"]);
    }

    #[test]
    fn plan_from_terminal_state_says_ninguno() {
        let request = TransitionRequest::new(Sale, "sale_1", "CERRADA", "BORRADOR", "user_1");
        let result = engine().plan(&request).unwrap();

        assert!(!result.success);
        assert_eq!(result.previous_state, "CERRADA");
        assert_eq!(result.new_state, "CERRADA");
        assert!(result.error.unwrap().contains("ninguno"));
    }
}
