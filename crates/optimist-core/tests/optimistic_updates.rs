//! Behavioral tests for optimistic create, toggle and delete.
//!
//! Time is paused; the simulated backend answers after 300ms, so every test
//! can check the optimistic state synchronously and the reconciled state after
//! the latency elapses.

use optimist_core::prelude::*;
use optimist_core::MutationError;
use optimist_test_utils::{past, settled_record, simulated_controller};
use std::time::Duration;

const LATENCY: Duration = Duration::from_millis(300);

fn controller() -> (MutationController, SimulatedBackend) {
    simulated_controller(300)
}

async fn past_latency() {
    past(LATENCY).await;
}

mod create {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn record_is_visible_before_backend_answers() {
        let (controller, backend) = controller();

        let id = controller.submit_create("New todo").unwrap();

        let record = controller.get(id).unwrap();
        assert_eq!(record.text, "New todo");
        assert!(record.pending);
        assert!(backend.stored().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_adds_nothing() {
        let (controller, _) = controller();

        assert!(controller.submit_create("").is_none());
        assert!(controller.submit_create("   ").is_none());

        past_latency().await;
        assert!(controller.is_empty());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn buy_milk_scenario() {
        let (controller, backend) = controller();

        let id = controller.submit_create("Buy milk").unwrap();
        assert!(controller.get(id).unwrap().pending);

        past_latency().await;
        let view = controller.view();
        assert_eq!(view.records.len(), 1);
        assert!(!view.records[0].pending);
        assert_eq!(backend.stored().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn will_fail_scenario() {
        let (controller, backend) = controller();
        controller.set_simulate_failure(true);

        let id = controller.submit_create("Will fail").unwrap();
        assert_eq!(controller.view().texts(), vec!["Will fail"]);

        past_latency().await;
        let view = controller.view();
        assert!(view.get(id).is_none());
        assert!(view.records.is_empty());
        let error: MutationError = view.last_error.unwrap();
        assert_eq!(error.kind, MutationKind::Create);
        assert_eq!(error.id, id);
        assert!(backend.stored().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_unique_and_increasing() {
        let (controller, _) = controller();
        let a = controller.submit_create("a").unwrap();
        let b = controller.submit_create("b").unwrap();
        assert!(b > a);

        controller.set_simulate_failure(true);
        let c = controller.submit_create("c").unwrap();
        controller.settled().await;

        controller.set_simulate_failure(false);
        let d = controller.submit_create("d").unwrap();
        assert!(d > c, "ids of failed creates are not reused");
    }
}

mod toggle {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn flips_immediately() {
        let (controller, _) = controller();
        let id = settled_record(&controller, "Test todo").await;

        controller.submit_toggle(id).unwrap();

        let record = controller.get(id).unwrap();
        assert!(record.done);
        assert!(record.pending);
    }

    #[tokio::test(start_paused = true)]
    async fn persists_on_success() {
        let (controller, backend) = controller();
        let id = settled_record(&controller, "Test todo").await;

        controller.submit_toggle(id).unwrap();
        past_latency().await;

        let record = controller.get(id).unwrap();
        assert!(record.done);
        assert!(!record.pending);
        assert!(backend.stored()[0].done);
        assert!(controller.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn reverts_on_failure() {
        let (controller, _) = controller();
        let id = settled_record(&controller, "X").await;

        controller.set_simulate_failure(true);
        controller.submit_toggle(id).unwrap();
        assert!(controller.get(id).unwrap().done);

        past_latency().await;
        let record = controller.get(id).unwrap();
        assert!(!record.done);
        assert!(!record.pending);
        assert_eq!(controller.last_error().unwrap().kind, MutationKind::Toggle);
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_twice_restores_original() {
        let (controller, _) = controller();
        let id = settled_record(&controller, "twice").await;

        controller.submit_toggle(id).unwrap();
        controller.settled().await;
        controller.submit_toggle(id).unwrap();
        controller.settled().await;

        let record = controller.get(id).unwrap();
        assert!(!record.done);
        assert!(!record.pending);
        assert_eq!(controller.view().in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_id_is_refused() {
        let (controller, _) = controller();
        assert_eq!(
            controller.submit_toggle(RecordId(404)),
            Err(SubmitError::NotFound(RecordId(404)))
        );
    }
}

mod delete {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn removes_immediately() {
        let (controller, _) = controller();
        let id = settled_record(&controller, "To delete").await;

        controller.submit_delete(id).unwrap();

        assert!(controller.get(id).is_none());
        assert!(controller.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stays_removed_on_success() {
        let (controller, backend) = controller();
        let id = settled_record(&controller, "To delete").await;

        controller.submit_delete(id).unwrap();
        past_latency().await;

        assert!(controller.get(id).is_none());
        assert!(backend.stored().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restores_on_failure() {
        let (controller, _) = controller();
        let id = settled_record(&controller, "To delete").await;

        controller.set_simulate_failure(true);
        controller.submit_delete(id).unwrap();
        assert!(controller.get(id).is_none());

        past_latency().await;
        let restored = controller.get(id).unwrap();
        assert_eq!(restored.text, "To delete");
        assert!(!restored.pending);
        assert_eq!(controller.last_error().unwrap().kind, MutationKind::Delete);
    }
}

mod failure_mode {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn calls_in_flight_are_unaffected_by_toggling() {
        let (controller, _) = controller();

        let id = controller.submit_create("issued while healthy").unwrap();
        controller.set_simulate_failure(true);
        assert!(controller.view().failure_mode);

        past_latency().await;
        let record = controller.get(id).unwrap();
        assert!(!record.pending);
        assert!(controller.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn flag_is_reported_in_view() {
        let (controller, _) = controller();
        assert!(!controller.view().failure_mode);

        controller.set_simulate_failure(true);
        assert!(controller.simulate_failure());
        assert!(controller.view().failure_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn flag_set_through_shared_switch_is_reported() {
        let (controller, backend) = controller();
        let switch = backend.failure_switch();

        switch.set(true);
        assert!(controller.simulate_failure());
        assert_eq!(controller.view().failure_mode, switch.is_on());

        let id = controller.submit_create("Will fail").unwrap();
        past_latency().await;
        assert!(controller.get(id).is_none());
        assert!(controller.view().failure_mode);

        switch.set(false);
        assert!(!controller.view().failure_mode);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unrelated_mutations_reconcile_independently() {
        let (controller, _) = controller();
        let keep = settled_record(&controller, "keep").await;
        let flip = settled_record(&controller, "flip").await;
        let gone = settled_record(&controller, "gone").await;

        controller.set_simulate_failure(true);
        controller.submit_toggle(flip).unwrap();
        controller.set_simulate_failure(false);
        controller.submit_delete(gone).unwrap();
        controller.submit_toggle(keep).unwrap();
        let fresh = controller.submit_create("fresh").unwrap();

        controller.settled().await;
        let view = controller.view();
        assert_eq!(view.texts(), vec!["keep", "flip", "fresh"]);
        assert!(view.get(keep).unwrap().done);
        assert!(!view.get(flip).unwrap().done);
        assert!(view.get(gone).is_none());
        assert!(!view.get(fresh).unwrap().pending);
        assert_eq!(view.last_error.unwrap().id, flip);
    }

    #[tokio::test(start_paused = true)]
    async fn later_failure_overwrites_error_slot() {
        let (controller, _) = controller();
        let a = settled_record(&controller, "a").await;
        let b = settled_record(&controller, "b").await;

        controller.set_simulate_failure(true);
        controller.submit_toggle(a).unwrap();
        controller.settled().await;
        controller.submit_delete(b).unwrap();
        controller.settled().await;

        let error = controller.last_error().unwrap();
        assert_eq!(error.kind, MutationKind::Delete);
        assert_eq!(error.id, b);
    }
}
