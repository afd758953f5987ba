//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 内存传输层上的 e2e 测试（无需 Redis）
//! - 生命周期与故障隔离

#[cfg(test)]
mod support;

#[cfg(test)]
mod contract_tests {
    use contracts::{Action, ConsumptionPattern, IndexParams};

    #[test]
    fn test_wire_names() {
        let names: Vec<_> = Action::ALL.iter().map(|a| a.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "insert",
                "delete",
                "create-collection",
                "drop-collection",
                "create-partition",
                "drop-partition",
                "create-index",
                "drop-index",
            ]
        );
        assert_eq!(ConsumptionPattern::parse("pub-sub"), Some(ConsumptionPattern::PubSub));
        assert_eq!(ConsumptionPattern::parse("queue"), Some(ConsumptionPattern::Queue));
        assert_eq!(ConsumptionPattern::parse("fanout"), None);
    }

    #[test]
    fn test_nlist_renders_as_extra_params() {
        assert_eq!(IndexParams::NList(1024).extra_params(), r#"{"nlist":1024}"#);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use broker::{BrokerEngine, BrokerError, EngineState};
    use bytes::Bytes;
    use contracts::{ConsumptionPattern, TransportProducer};
    use dispatcher::{MemorySink, SinkCall};
    use transport::MemoryTransport;

    use crate::support::{wait_for, Phase, ProbeLog, ProbeSink, SeveringTransport};

    const INSERT: &[u8] = br#"{"action":"insert","vector":"0000803f","collection_name":"c1","partition_tag":"p1","id":7}"#;
    const DROP_INDEX: &[u8] = br#"{"action":"drop-index","collection_name":"c1","partition_tag":"ignored","id":99}"#;
    const UNKNOWN: &[u8] = br#"{"action":"unknown"}"#;

    fn insert_event(id: i64) -> Bytes {
        Bytes::from(format!(
            r#"{{"action":"insert","vector":"0000803f","collection_name":"c1","partition_tag":"p1","id":{id}}}"#
        ))
    }

    fn memory_engine(
        transport: &MemoryTransport,
        sinks: &[MemorySink],
    ) -> Arc<BrokerEngine<MemoryTransport, MemorySink>> {
        Arc::new(
            BrokerEngine::builder("memory", Arc::new(transport.clone()))
                .replicas(sinks.iter().cloned())
                .build()
                .unwrap(),
        )
    }

    fn spawn_start<T, S>(
        engine: &Arc<BrokerEngine<T, S>>,
        channel: &'static str,
        pattern: ConsumptionPattern,
    ) -> tokio::task::JoinHandle<Result<(), BrokerError>>
    where
        T: contracts::TransportConsumer + 'static,
        S: contracts::ReplicaSink + Sync + 'static,
    {
        let engine = Arc::clone(engine);
        tokio::spawn(async move { engine.start(channel, pattern).await })
    }

    async fn finish(
        task: tokio::task::JoinHandle<Result<(), BrokerError>>,
    ) -> Result<(), BrokerError> {
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("engine did not exit")
            .unwrap()
    }

    /// One insert, one replica: exactly one Insert with the decoded vector
    #[tokio::test]
    async fn test_insert_example() {
        let transport = MemoryTransport::new();
        let sink = MemorySink::new("a");
        let engine = memory_engine(&transport, std::slice::from_ref(&sink));
        let task = spawn_start(&engine, "q", ConsumptionPattern::Queue);

        transport.push("q", Bytes::from_static(INSERT)).await.unwrap();
        wait_for(|| !sink.calls().is_empty()).await;
        engine.stop().unwrap();
        finish(task).await.unwrap();

        assert_eq!(
            sink.calls(),
            vec![SinkCall::Insert {
                collection: "c1".into(),
                partition: "p1".into(),
                id: 7,
                vector: vec![1.0],
            }]
        );
    }

    /// drop-index reaches every replica once, extra fields ignored
    #[tokio::test]
    async fn test_drop_index_per_replica() {
        let transport = MemoryTransport::new();
        let sinks = [MemorySink::new("a"), MemorySink::new("b"), MemorySink::new("c")];
        let engine = memory_engine(&transport, &sinks);
        let task = spawn_start(&engine, "q", ConsumptionPattern::Queue);

        transport.push("q", Bytes::from_static(DROP_INDEX)).await.unwrap();
        wait_for(|| sinks.iter().all(|s| !s.calls().is_empty())).await;
        engine.stop().unwrap();
        finish(task).await.unwrap();

        for sink in &sinks {
            assert_eq!(
                sink.calls(),
                vec![SinkCall::DropIndex {
                    collection: "c1".into()
                }]
            );
        }
    }

    /// Unknown action: no sink call, one unsupported-action record
    #[tokio::test]
    async fn test_unknown_action_is_dropped() {
        let transport = MemoryTransport::new();
        let sink = MemorySink::new("a");
        let engine = memory_engine(&transport, std::slice::from_ref(&sink));
        let task = spawn_start(&engine, "q", ConsumptionPattern::Queue);

        transport.push("q", Bytes::from_static(UNKNOWN)).await.unwrap();
        transport.push("q", Bytes::from_static(b"{broken")).await.unwrap();
        // Sentinel proves the loop kept going
        transport.push("q", Bytes::from_static(DROP_INDEX)).await.unwrap();

        wait_for(|| !sink.calls().is_empty()).await;
        engine.stop().unwrap();
        finish(task).await.unwrap();

        assert_eq!(sink.calls().len(), 1);
        let stats = engine.stats();
        assert_eq!(stats.received, 3);
        assert_eq!(stats.decode_failures, 2);
        assert_eq!(stats.unsupported_actions, 1);
    }

    /// Queue: every replica finishes message i before any begins i+1
    #[tokio::test]
    async fn test_queue_barrier_ordering() {
        let transport = MemoryTransport::new();
        let log = ProbeLog::default();
        let delays = [0u64, 15, 30];
        let engine = Arc::new(
            BrokerEngine::builder("memory", Arc::new(transport.clone()))
                .replicas(
                    delays
                        .iter()
                        .enumerate()
                        .map(|(i, ms)| ProbeSink::new(i, Duration::from_millis(*ms), log.clone())),
                )
                .build()
                .unwrap(),
        );

        for id in 1..=3 {
            transport.push("q", insert_event(id)).await.unwrap();
        }
        let task = spawn_start(&engine, "q", ConsumptionPattern::Queue);

        wait_for(|| log.count(Phase::End) == 9).await;
        engine.stop().unwrap();
        finish(task).await.unwrap();

        let events = log.events();
        for (position, event) in events.iter().enumerate() {
            if event.1 != Phase::Begin || event.2 == 1 {
                continue;
            }
            let previous = event.2 - 1;
            let ends_before = events[..position]
                .iter()
                .filter(|e| e.1 == Phase::End && e.2 == previous)
                .count();
            assert_eq!(ends_before, delays.len(), "message {} started early: {events:?}", event.2);
        }

        // Queue order per replica
        for replica in 0..delays.len() {
            let ids: Vec<_> = events
                .iter()
                .filter(|e| e.0 == replica && e.1 == Phase::End)
                .map(|e| e.2)
                .collect();
            assert_eq!(ids, vec![1, 2, 3]);
        }
    }

    /// Queue: a failing replica neither blocks the others nor the next message
    #[tokio::test]
    async fn test_queue_replica_failure_isolated() {
        let transport = MemoryTransport::new();
        let sinks = [MemorySink::new("bad").failing_ids([1]), MemorySink::new("good")];
        let engine = memory_engine(&transport, &sinks);
        let task = spawn_start(&engine, "q", ConsumptionPattern::Queue);

        transport.push("q", insert_event(1)).await.unwrap();
        transport.push("q", insert_event(2)).await.unwrap();
        wait_for(|| sinks[1].calls().len() == 2 && sinks[0].calls().len() == 1).await;
        engine.stop().unwrap();
        finish(task).await.unwrap();

        assert_eq!(sinks[0].failures(), 1);
        let metrics = engine.replica_metrics();
        assert_eq!(metrics[0].1.failed, 1);
        assert_eq!(metrics[0].1.dispatched, 1);
        assert_eq!(metrics[1].1.dispatched, 2);
    }

    /// PubSub: failure on m1 does not stop the same replica on m2, nor others on m1
    #[tokio::test]
    async fn test_pub_sub_failure_isolation() {
        let transport = MemoryTransport::new();
        let sinks = [MemorySink::new("bad").failing_ids([1]), MemorySink::new("good")];
        let engine = memory_engine(&transport, &sinks);
        let task = spawn_start(&engine, "cdc", ConsumptionPattern::PubSub);

        wait_for(|| transport.subscriber_count("cdc") == 2).await;
        transport.publish("cdc", insert_event(1)).await.unwrap();
        transport.publish("cdc", insert_event(2)).await.unwrap();

        wait_for(|| sinks[0].calls().len() == 1 && sinks[1].calls().len() == 2).await;
        engine.stop().unwrap();
        finish(task).await.unwrap();

        assert!(matches!(sinks[0].calls()[0], SinkCall::Insert { id: 2, .. }));
        assert_eq!(sinks[0].failures(), 1);
    }

    /// PubSub: a slow replica does not hold back a fast one
    #[tokio::test]
    async fn test_pub_sub_replicas_progress_independently() {
        let transport = MemoryTransport::new();
        let slow = MemorySink::new("slow").with_delay(Duration::from_millis(300));
        let fast = MemorySink::new("fast");
        let engine = memory_engine(&transport, &[slow.clone(), fast.clone()]);
        let task = spawn_start(&engine, "cdc", ConsumptionPattern::PubSub);

        wait_for(|| transport.subscriber_count("cdc") == 2).await;
        for id in 1..=3 {
            transport.publish("cdc", insert_event(id)).await.unwrap();
        }

        wait_for(|| fast.calls().len() == 3).await;
        assert!(slow.calls().len() < 3);

        engine.stop().unwrap();
        finish(task).await.unwrap();
    }

    /// PubSub: a severed subscription ends only its own loop
    #[tokio::test]
    async fn test_severed_subscription_ends_one_loop() {
        let transport = SeveringTransport::new(1);
        let sinks = [MemorySink::new("a"), MemorySink::new("b")];
        let engine = Arc::new(
            BrokerEngine::builder("severing", Arc::new(transport.clone()))
                .replicas(sinks.iter().cloned())
                .build()
                .unwrap(),
        );
        let task = spawn_start(&engine, "cdc", ConsumptionPattern::PubSub);

        wait_for(|| transport.inner.subscriber_count("cdc") == 2).await;
        transport.publish("cdc", DROP_INDEX).await;
        wait_for(|| sinks.iter().all(|s| s.calls().len() == 1)).await;

        // The first subscription fails on its next receive
        wait_for(|| transport.inner.subscriber_count("cdc") == 1).await;
        transport.publish("cdc", DROP_INDEX).await;
        wait_for(|| sinks.iter().map(|s| s.calls().len()).sum::<usize>() == 3).await;

        assert_eq!(engine.state(), EngineState::Running);
        let mut counts: Vec<_> = sinks.iter().map(|s| s.calls().len()).collect();
        counts.sort();
        assert_eq!(counts, vec![1, 2]);

        engine.stop().unwrap();
        finish(task).await.unwrap();
    }

    /// PubSub: once every subscription ends the engine reports a transport error
    #[tokio::test]
    async fn test_closed_channel_terminates_engine() {
        let transport = MemoryTransport::new();
        let engine = memory_engine(&transport, &[MemorySink::new("a"), MemorySink::new("b")]);
        let task = spawn_start(&engine, "cdc", ConsumptionPattern::PubSub);

        wait_for(|| transport.subscriber_count("cdc") == 2).await;
        transport.close_channel("cdc");

        let err = finish(task).await.unwrap_err();
        assert!(matches!(err, BrokerError::Transport { .. }));
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    /// Stop waits for the in-flight fan-out and leaves later messages queued
    #[tokio::test]
    async fn test_stop_never_half_processes() {
        let transport = MemoryTransport::new();
        let log = ProbeLog::default();
        let engine = Arc::new(
            BrokerEngine::builder("memory", Arc::new(transport.clone()))
                .replicas((0..2).map(|i| ProbeSink::new(i, Duration::from_millis(100), log.clone())))
                .build()
                .unwrap(),
        );
        let task = spawn_start(&engine, "q", ConsumptionPattern::Queue);

        transport.push("q", insert_event(1)).await.unwrap();
        wait_for(|| log.count(Phase::Begin) == 2).await;
        transport.push("q", insert_event(2)).await.unwrap();

        engine.stop().unwrap();
        finish(task).await.unwrap();

        assert_eq!(log.count(Phase::End), 2);
        assert_eq!(log.count(Phase::Begin), 2);
        assert_eq!(transport.queue_len("q"), 1);
    }

    /// Stop unblocks an idle pub-sub engine with every loop waiting on receive
    #[tokio::test]
    async fn test_stop_idle_pub_sub() {
        let transport = MemoryTransport::new();
        let engine = memory_engine(&transport, &[MemorySink::new("a"), MemorySink::new("b")]);
        let task = spawn_start(&engine, "cdc", ConsumptionPattern::PubSub);

        wait_for(|| transport.subscriber_count("cdc") == 2).await;
        engine.stop().unwrap();
        finish(task).await.unwrap();

        assert_eq!(transport.subscriber_count("cdc"), 0);
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use broker::{BrokerEngine, BrokerRegistry, EngineState, LifecycleError, RelayController};
    use dispatcher::MemorySink;
    use transport::MemoryTransport;

    use crate::support::{wait_for, SeveringTransport};

    fn controller(transport: &SeveringTransport) -> RelayController {
        let engine = BrokerEngine::builder("redis", Arc::new(transport.clone()))
            .replica(MemorySink::new("a"))
            .build()
            .unwrap();
        let mut registry = BrokerRegistry::new();
        registry.register(Arc::new(engine)).unwrap();
        RelayController::new(registry)
    }

    #[tokio::test]
    async fn test_invalid_pattern_touches_no_transport() {
        let transport = SeveringTransport::new(usize::MAX);
        let controller = controller(&transport);

        let err = controller.start("redis", "cdc", "broadcast").await.unwrap_err();
        assert!(matches!(
            err.lifecycle(),
            Some(LifecycleError::InvalidPattern { .. })
        ));
        assert_eq!(transport.interactions(), 0);
    }

    #[tokio::test]
    async fn test_unknown_transport() {
        let transport = SeveringTransport::new(usize::MAX);
        let err = controller(&transport)
            .start("kafka", "cdc", "queue")
            .await
            .unwrap_err();
        assert_eq!(
            err.lifecycle(),
            Some(&LifecycleError::UnknownTransport {
                name: "kafka".into()
            })
        );
    }

    #[tokio::test]
    async fn test_second_start_and_stop_fail_fast() {
        let transport = SeveringTransport::new(usize::MAX);
        let controller = controller(&transport);

        let running = controller.clone();
        let task = tokio::spawn(async move { running.start("redis", "q", "queue").await });
        let broker = controller.registry().get("redis").unwrap();
        wait_for(|| broker.state() == EngineState::Running).await;

        let err = controller.start("redis", "q", "queue").await.unwrap_err();
        assert!(matches!(
            err.lifecycle(),
            Some(LifecycleError::AlreadyRunning { .. })
        ));

        controller.stop("redis").unwrap();
        assert!(controller.stop("redis").is_err());

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let restart = controller.start("redis", "q", "queue").await.unwrap_err();
        assert!(matches!(
            restart.lifecycle(),
            Some(LifecycleError::AlreadyStopped { .. })
        ));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = BrokerRegistry::new();
        for _ in 0..2 {
            let engine = BrokerEngine::builder("memory", Arc::new(MemoryTransport::new()))
                .replica(MemorySink::new("a"))
                .build()
                .unwrap();
            let _ = registry.register(Arc::new(engine));
        }
        assert_eq!(registry.len(), 1);
    }
}

#[cfg(test)]
mod config_e2e_tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use broker::BrokerEngine;
    use bytes::Bytes;
    use codec::MutationDecoder;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ConsumptionPattern, TransportProducer};
    use transport::MemoryTransport;

    use crate::support::wait_for;

    /// Config-built journal replicas under the queue pattern
    #[tokio::test]
    async fn test_file_replicas_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            r#"
[relay]
transport = "mem"
channel = "cdc"
pattern = "queue"
index_params = "extra-params"

[[transports]]
name = "mem"
kind = "memory"

[[replicas]]
name = "journal-a"
sink_type = "file"
[replicas.params]
base_path = "{0}"

[[replicas]]
name = "journal-b"
sink_type = "file"
timeout_ms = 500
[replicas.params]
base_path = "{0}"
"#,
            dir.path().display()
        );
        let config = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();
        let replicas = dispatcher::create_replicas(&config.replicas).await.unwrap();

        let transport = MemoryTransport::new();
        let engine = Arc::new(
            BrokerEngine::builder("mem", Arc::new(transport.clone()))
                .replicas(replicas)
                .decoder(MutationDecoder::new(config.relay.index_params))
                .build()
                .unwrap(),
        );

        let pattern = ConsumptionPattern::parse(&config.relay.pattern).unwrap();
        let running = Arc::clone(&engine);
        let channel = config.relay.channel.clone();
        let task = tokio::spawn(async move { running.start(&channel, pattern).await });

        transport
            .push(
                "cdc",
                Bytes::from_static(
                    br#"{"action":"create-index","collection_name":"c1","index_type":2,"extra_params":"{\"nlist\":16}"}"#,
                ),
            )
            .await
            .unwrap();

        let journal = |name: &str| dir.path().join(format!("{name}.jsonl"));
        wait_for(|| {
            ["journal-a", "journal-b"].iter().all(|name| {
                std::fs::read_to_string(journal(name))
                    .map(|s| s.lines().count() == 1)
                    .unwrap_or(false)
            })
        })
        .await;

        engine.stop().unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let line = std::fs::read_to_string(journal("journal-a")).unwrap();
        let entry: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(entry["replica"], "journal-a");
        let call = &entry["call"]["create-index"];
        assert_eq!(call["collection"], "c1");
        assert_eq!(call["index_type"], 2);
        assert_eq!(call["extra_params"], r#"{"nlist":16}"#);
    }

    #[test]
    fn test_example_config_file_loads() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(
            br#"{
                "relay": { "transport": "redis", "channel": "cdc", "pattern": "pub-sub" },
                "transports": [{ "name": "redis", "kind": "redis", "url": "redis://localhost:6379" }],
                "replicas": [{ "name": "a", "sink_type": "network", "params": { "addr": "127.0.0.1:9100" } }]
            }"#,
        )
        .unwrap();
        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.replicas[0].params["addr"], "127.0.0.1:9100");
    }

    #[test]
    fn test_sample_relay_toml_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/relay.toml");
        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.relay.transport, "redis");
        assert_eq!(ConsumptionPattern::parse(&config.relay.pattern), Some(ConsumptionPattern::PubSub));
        assert_eq!(config.transports.len(), 2);
        let names: Vec<_> = config.replicas.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["console", "journal", "mirror"]);
        assert_eq!(config.replicas[1].timeout_ms, 5000);
    }
}
