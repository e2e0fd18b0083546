#[cfg(test)]
mod tests {
    use crate::process::{ManagedProcess, TAIL_CAP};
    use std::time::Duration;

    #[tokio::test]
    async fn inactive_process_reports_sentinel_values() {
        let process = ManagedProcess::new("p1", "sleep 30", "/tmp", false, false);
        assert!(!process.poll_active().await);
        assert_eq!(process.pid(), -1);
        assert_eq!(process.uptime().await, Duration::ZERO);
        assert_eq!(process.get_mem_usage().await, 0);
        assert_eq!(process.get_cpu_perc().await, 0.0);
    }

    #[tokio::test]
    async fn start_reports_an_active_process_with_a_real_pid() {
        let mut process = ManagedProcess::new("p1", "sleep 30", "/tmp", false, false);
        process.start(true).await.expect("spawn should succeed");

        assert!(process.poll_active().await);
        assert!(process.pid() > 0);

        process.kill().await.expect("kill should succeed");
        assert!(!process.poll_active().await);
        assert_eq!(process.pid(), -1);
    }

    #[tokio::test]
    async fn starting_an_already_active_process_is_rejected() {
        let mut process = ManagedProcess::new("p1", "sleep 30", "/tmp", false, false);
        process.start(true).await.unwrap();

        let err = process.start(true).await.unwrap_err();
        assert!(matches!(err, crate::error::DaemonError::AlreadyRunning(name) if name == "p1"));

        process.kill().await.unwrap();
    }

    #[tokio::test]
    async fn killing_an_inactive_process_is_rejected() {
        let mut process = ManagedProcess::new("p1", "sleep 30", "/tmp", false, false);
        let err = process.kill().await.unwrap_err();
        assert!(matches!(err, crate::error::DaemonError::NotActive(name) if name == "p1"));
    }

    #[tokio::test]
    async fn stdout_tail_is_bounded_to_its_cap() {
        // "yes" floods stdout fast enough to blow well past TAIL_CAP within
        // a couple hundred milliseconds.
        let mut process = ManagedProcess::new("p1", "yes", "/tmp", false, false);
        process.start(true).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        process.kill().await.unwrap();

        // Give the drain task a moment to flush whatever was buffered.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let tail = process.stdout_tail().await;
        assert!(tail.len() <= TAIL_CAP);
        assert!(!tail.is_empty());
    }
}
