#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::client::Client;
    use crate::config::AppConfig;
    use crate::supervisor::Supervisor;

    async fn spawn_daemon() -> (Client, tokio::task::JoinHandle<()>) {
        let config = AppConfig {
            port: 0,
            logdir: None,
            log_frequency: 60,
            debug_mode: false,
        };
        let supervisor = Supervisor::start(&config).await.expect("bind should succeed");
        let addr = supervisor.local_addr();
        let handle = tokio::spawn(supervisor.run());
        (Client::new(addr), handle)
    }

    #[tokio::test]
    async fn add_list_and_stdout_round_trip_over_the_wire() {
        let (client, handle) = spawn_daemon().await;

        let msg = client.add("p1", "echo hi", false, false, "/tmp").await.unwrap();
        assert_eq!(msg, "Successfully added process 'p1'");

        let entries = client.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "p1");
        assert_eq!(entries[0].command, "echo hi");

        client.start(Some("p1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        let tail = client.stdout("p1").await.unwrap();
        assert_eq!(String::from_utf8_lossy(&tail).trim(), "hi");

        client.stop().await.unwrap();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn duplicate_add_over_the_wire_renders_the_daemons_error_message() {
        let (client, handle) = spawn_daemon().await;

        client.add("p1", "sleep 30", false, false, "/tmp").await.unwrap();
        // There's no separate error channel for MSG responses: the duplicate
        // rejection arrives as an ordinary MSG string.
        let msg = client.add("p1", "sleep 1", false, false, "/tmp").await.unwrap();
        assert_eq!(msg, "Error: There is already a process named 'p1'");

        client.rem("p1").await.unwrap();
        client.stop().await.unwrap();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn stop_shuts_the_daemon_down_so_a_second_connection_is_refused() {
        let (client, handle) = spawn_daemon().await;

        let msg = client.stop().await.unwrap();
        assert!(msg.starts_with("Stopped pypm running on"));
        let _ = handle.await;

        let err = client.list().await.unwrap_err();
        assert!(matches!(err, crate::client::ClientError::Connect(_, _)));
    }
}
