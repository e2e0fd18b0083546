#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use crate::control::ShutdownFlag;
    use crate::dispatcher::CommandDispatcher;
    use crate::wire::{self, Frame};

    fn dispatcher() -> CommandDispatcher {
        let addr: SocketAddr = ([127, 0, 0, 1], 9999).into();
        CommandDispatcher::new(Arc::new(ShutdownFlag::new()), addr)
    }

    #[tokio::test]
    async fn add_then_list_preserves_insertion_order_and_command() {
        let mut dispatcher = dispatcher();
        for name in ["c", "a", "b"] {
            let line = format!("add {} 'sleep 30' False False /tmp", name);
            let frame = dispatcher.dispatch(&line).await;
            assert!(matches!(frame, Frame::Msg(ref s) if s.contains("Successfully added")));
        }

        let frame = dispatcher.dispatch("list").await;
        let Frame::Data(payload) = frame else { panic!("expected DATA frame") };
        let records = wire::decode_list(&payload);
        assert_eq!(
            records,
            vec![
                ("c".to_string(), "sleep 30".to_string()),
                ("a".to_string(), "sleep 30".to_string()),
                ("b".to_string(), "sleep 30".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_add_reports_the_existing_name() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch("add p1 'sleep 30' False False /tmp").await;
        let frame = dispatcher.dispatch("add p1 'sleep 1' False False /tmp").await;
        assert_eq!(
            frame,
            Frame::Msg("Error: There is already a process named 'p1'".to_string())
        );
    }

    #[tokio::test]
    async fn wrong_arity_is_rejected_before_any_action() {
        let mut dispatcher = dispatcher();
        let frame = dispatcher.dispatch("add p1 'sleep 30'").await;
        assert_eq!(frame, Frame::Msg("Error: Invalid number of arguments".to_string()));
        // the bad add must not have registered anything
        let Frame::Data(payload) = dispatcher.dispatch("list").await else { panic!("expected DATA") };
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn mem_cpu_pid_uptime_on_missing_name_is_not_found() {
        let mut dispatcher = dispatcher();
        for verb in ["mem", "cpu", "pid", "uptime"] {
            let frame = dispatcher.dispatch(&format!("{} ghost", verb)).await;
            assert_eq!(frame, Frame::Msg("Error: Couldn't find process 'ghost'".to_string()));
        }
    }

    #[tokio::test]
    async fn pid_before_start_reports_sentinel_and_after_start_reports_a_real_pid() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch("add p1 'sleep 30' False False /tmp").await;

        let Frame::Data(payload) = dispatcher.dispatch("pid p1").await else { panic!("expected DATA") };
        assert_eq!(wire::decode_i32_records(&payload), vec![("p1".to_string(), -1)]);

        let frame = dispatcher.dispatch("start p1").await;
        assert!(matches!(frame, Frame::Msg(ref s) if s.contains("Successfully started")));

        let Frame::Data(payload) = dispatcher.dispatch("pid p1").await else { panic!("expected DATA") };
        let records = wire::decode_i32_records(&payload);
        assert_eq!(records.len(), 1);
        assert!(records[0].1 > 0);

        dispatcher.dispatch("kill p1").await;
    }

    #[tokio::test]
    async fn kill_then_queries_report_inactive_sentinels() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch("add p1 'sleep 30' False False /tmp").await;
        dispatcher.dispatch("start p1").await;
        dispatcher.dispatch("kill p1").await;

        let Frame::Data(payload) = dispatcher.dispatch("mem p1").await else { panic!("expected DATA") };
        assert_eq!(wire::decode_f64_records(&payload), vec![("p1".to_string(), 0.0)]);

        let Frame::Data(payload) = dispatcher.dispatch("cpu p1").await else { panic!("expected DATA") };
        assert_eq!(wire::decode_f64_records(&payload), vec![("p1".to_string(), 0.0)]);

        let Frame::Data(payload) = dispatcher.dispatch("pid p1").await else { panic!("expected DATA") };
        assert_eq!(wire::decode_i32_records(&payload), vec![("p1".to_string(), -1)]);

        let Frame::Data(payload) = dispatcher.dispatch("uptime p1").await else { panic!("expected DATA") };
        assert_eq!(wire::decode_uptime_records(&payload), vec![("p1".to_string(), "0s".to_string())]);
    }

    #[tokio::test]
    async fn kill_on_inactive_process_is_not_active() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch("add p1 'sleep 30' False False /tmp").await;
        let frame = dispatcher.dispatch("kill p1").await;
        assert_eq!(frame, Frame::Msg("Error: Process 'p1' is not active".to_string()));
    }

    #[tokio::test]
    async fn rem_removes_an_active_process_from_subsequent_list() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch("add p1 'sleep 30' False False /tmp").await;
        dispatcher.dispatch("start p1").await;
        let frame = dispatcher.dispatch("rem p1").await;
        assert!(matches!(frame, Frame::Msg(ref s) if s.contains("Successfully removed")));

        let Frame::Data(payload) = dispatcher.dispatch("list").await else { panic!("expected DATA") };
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn start_without_a_name_starts_every_eligible_process() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch("add p1 'sleep 30' False False /tmp").await;
        dispatcher.dispatch("add p2 'sleep 30' False False /tmp").await;

        let frame = dispatcher.dispatch("start").await;
        assert_eq!(frame, Frame::Msg("Started 2 out of 2 processes".to_string()));

        dispatcher.dispatch("kill p1").await;
        dispatcher.dispatch("kill p2").await;
    }

    #[tokio::test]
    async fn start_without_a_name_on_an_empty_registry_warns() {
        let mut dispatcher = dispatcher();
        let frame = dispatcher.dispatch("start").await;
        assert_eq!(frame, Frame::Msg("Warning: No processes to start".to_string()));
    }

    #[tokio::test]
    async fn start_without_a_name_when_all_already_running_warns() {
        let mut dispatcher = dispatcher();
        dispatcher.dispatch("add p1 'sleep 30' False False /tmp").await;
        dispatcher.dispatch("start p1").await;

        let frame = dispatcher.dispatch("start").await;
        assert_eq!(frame, Frame::Msg("Warning: No processes were started".to_string()));

        dispatcher.dispatch("kill p1").await;
    }

    #[tokio::test]
    async fn stop_sets_the_shutdown_flag() {
        let mut dispatcher = dispatcher();
        let frame = dispatcher.dispatch("stop").await;
        assert!(matches!(frame, Frame::Msg(ref s) if s.starts_with("Stopped pypm running on")));
    }

    #[tokio::test]
    async fn empty_or_unknown_verb_is_invalid_command() {
        let mut dispatcher = dispatcher();
        assert_eq!(dispatcher.dispatch("").await, Frame::Msg("Error: Invalid command".to_string()));
        assert_eq!(
            dispatcher.dispatch("frobnicate").await,
            Frame::Msg("Error: Invalid command".to_string())
        );
    }
}
