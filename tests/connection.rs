//! Integration tests for the protocol engine, driven through a scripted
//! fake server on a real unix socket.

mod support;

use futures::StreamExt;
use pulsewire::{
    Connection, EventKind, EventRecord, Facility, PulseError, SubscriptionMask, Volume,
    proto::{Command, FrameCodec, Inbound, Reply, Tag},
};
use support::{
    LineCodec, accept_raw, bind_server, connect_pair, decode_client_frame, encode_server_reply,
    server_info_fixture, sink_fixture, test_config,
};

fn event(facility: Facility, kind: EventKind, index: u32) -> EventRecord {
    EventRecord {
        facility,
        kind,
        index,
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn set_mute_round_trip_then_close_rejects_operations() {
        let (_dir, connection, mut server) = connect_pair().await;
        assert!(connection.is_ready());

        let (result, ()) = tokio::join!(connection.set_sink_mute(0, true), async {
            let (tag, command) = server.read_command().await;
            assert_eq!(command, Command::SetSinkMute { index: 0, mute: true });
            server.send_reply(tag, Reply::Ack).await;
        });
        result.expect("mute confirmed");

        connection.close().await;
        assert_eq!(connection.state(), pulsewire::ConnectionState::Closed);

        let err = connection.set_sink_mute(0, false).await.unwrap_err();
        assert!(matches!(err, PulseError::State { .. }), "got {err:?}");

        server.expect_disconnect().await;
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (_dir, connection, _server) = connect_pair().await;
        connection.close().await;
        connection.close().await;
        assert_eq!(connection.state(), pulsewire::ConnectionState::Closed);
    }

    #[tokio::test]
    async fn rejected_auth_surfaces_as_connect_error() {
        let (dir, path, listener) = bind_server();
        let server = tokio::spawn(async move {
            let mut conn = accept_raw(&listener).await;
            let (tag, command) = conn.read_command().await;
            assert!(matches!(command, Command::Auth { .. }));
            conn.send_error(tag, 9).await;
        });

        let err = Connection::connect(test_config(&path, &dir), Box::new(LineCodec))
            .await
            .unwrap_err();
        assert!(matches!(err, PulseError::Connect { .. }), "got {err:?}");
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn unreachable_socket_surfaces_as_connect_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nowhere");
        let err = Connection::connect(test_config(&path, &dir), Box::new(LineCodec))
            .await
            .unwrap_err();
        assert!(matches!(err, PulseError::Connect { .. }));
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn replies_resolve_by_tag_under_reordering() {
        let (_dir, connection, mut server) = connect_pair().await;

        let (sinks, info, modules, ()) = tokio::join!(
            connection.sink_list(),
            connection.server_info(),
            connection.module_list(),
            async {
                let mut ordered = Vec::new();
                for _ in 0..3 {
                    ordered.push(server.read_command().await);
                }
                // answer in reverse issuance order
                for (tag, command) in ordered.into_iter().rev() {
                    let reply = match command {
                        Command::GetSinkList => Reply::SinkList(vec![sink_fixture(0, "alpha")]),
                        Command::GetServerInfo => Reply::ServerInfo(server_info_fixture()),
                        Command::GetModuleList => Reply::ModuleList(Vec::new()),
                        other => panic!("unexpected command {other:?}"),
                    };
                    server.send_reply(tag, reply).await;
                }
            }
        );

        assert_eq!(sinks.expect("sink list")[0].name, "alpha");
        assert_eq!(info.expect("server info").name, "pulseaudio");
        assert!(modules.expect("module list").is_empty());
    }

    #[tokio::test]
    async fn server_rejection_fails_only_that_request() {
        let (_dir, connection, mut server) = connect_pair().await;

        let (missing, ()) = tokio::join!(connection.sink_info(99), async {
            let (tag, _) = server.read_command().await;
            server.send_error(tag, 5).await;
        });
        match missing.unwrap_err() {
            PulseError::Operation(code) => assert_eq!(code.0, 5),
            other => panic!("expected operation error, got {other:?}"),
        }

        // the connection survives a per-request rejection
        let (sinks, ()) = tokio::join!(connection.sink_list(), async {
            let (tag, _) = server.read_command().await;
            server.send_reply(tag, Reply::SinkList(Vec::new())).await;
        });
        assert!(sinks.expect("sink list").is_empty());
    }

    #[tokio::test]
    async fn cancelled_request_frees_slot_and_late_reply_is_discarded() {
        let (_dir, connection, mut server) = connect_pair().await;

        let mut abandoned = Box::pin(connection.server_info());
        // poll once so the command reaches the wire, then cancel
        assert!(futures::poll!(abandoned.as_mut()).is_pending());
        drop(abandoned);

        let (stale_tag, command) = server.read_command().await;
        assert!(matches!(command, Command::GetServerInfo));
        server
            .send_reply(stale_tag, Reply::ServerInfo(server_info_fixture()))
            .await;

        // the late reply must not disturb the next request
        let (info, ()) = tokio::join!(connection.server_info(), async {
            let (tag, _) = server.read_command().await;
            assert_ne!(tag, stale_tag);
            server
                .send_reply(tag, Reply::ServerInfo(server_info_fixture()))
                .await;
        });
        assert_eq!(info.expect("server info").version, "17.0");
    }

    #[tokio::test]
    async fn split_frame_is_reassembled() {
        let (_dir, connection, mut server) = connect_pair().await;

        let (info, ()) = tokio::join!(connection.server_info(), async {
            let (tag, _) = server.read_command().await;
            let bytes = encode_server_reply(tag, Reply::ServerInfo(server_info_fixture()));
            let (head, tail) = bytes.split_at(7);
            server.send_raw(head).await;
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            server.send_raw(tail).await;
        });
        assert_eq!(info.expect("server info").sample_rate, 48_000);
    }
}

mod shutdown {
    use super::*;

    #[tokio::test]
    async fn close_fails_pending_and_ends_listeners_gracefully() {
        for k in [0usize, 1, 5] {
            let (_dir, connection, mut server) = connect_pair().await;

            let (listener, ()) =
                tokio::join!(connection.subscribe_events(SubscriptionMask::ALL), async {
                    let (tag, command) = server.read_command().await;
                    assert!(matches!(command, Command::Subscribe { .. }));
                    server.send_reply(tag, Reply::Ack).await;
                });
            let mut listener = listener.expect("subscribe");

            let requests: Vec<_> = (0..k).map(|_| connection.server_info()).collect();
            let (results, ()) = tokio::join!(futures::future::join_all(requests), async {
                for _ in 0..k {
                    let _ = server.read_command().await;
                }
                connection.close().await;
            });

            assert_eq!(results.len(), k);
            for result in results {
                assert!(
                    matches!(result.unwrap_err(), PulseError::ConnectionClosed),
                    "pending request must fail with ConnectionClosed (k={k})"
                );
            }

            // graceful end: no terminal error item
            assert!(listener.next().await.is_none(), "k={k}");
        }
    }

    #[tokio::test]
    async fn malformed_frame_is_fatal_for_everything() {
        let (_dir, connection, mut server) = connect_pair().await;

        let mut listener = connection.listen().await.expect("listener");

        let (pending, ()) = tokio::join!(connection.server_info(), async {
            let _ = server.read_command().await;
            server.send_raw(b"not a frame\n").await;
        });
        assert!(matches!(
            pending.unwrap_err(),
            PulseError::ConnectionClosed
        ));

        // listeners observe a terminal failure, not a graceful end
        let terminal = listener.next().await.expect("terminal item");
        assert!(matches!(terminal.unwrap_err(), PulseError::ConnectionClosed));
        assert!(listener.next().await.is_none());

        let err = connection.sink_list().await.unwrap_err();
        assert!(matches!(err, PulseError::State { .. }));
    }

    #[tokio::test]
    async fn server_disconnect_fails_in_flight_requests() {
        let (_dir, connection, mut server) = connect_pair().await;

        let (pending, ()) = tokio::join!(connection.sink_list(), async {
            let _ = server.read_command().await;
            drop(server);
        });
        assert!(matches!(
            pending.unwrap_err(),
            PulseError::ConnectionClosed
        ));
    }
}

mod events {
    use super::*;

    async fn subscribe(
        connection: &Connection,
        server: &mut support::ServerConn,
        mask: SubscriptionMask,
    ) {
        let (result, ()) = tokio::join!(connection.subscribe(mask), async {
            let (tag, command) = server.read_command().await;
            assert_eq!(command, Command::Subscribe { mask });
            server.send_reply(tag, Reply::Ack).await;
        });
        result.expect("subscribe");
    }

    #[tokio::test]
    async fn every_listener_sees_every_event_in_order() {
        let (_dir, connection, mut server) = connect_pair().await;

        let mut first = connection.listen().await.expect("listener");
        let mut second = connection.listen().await.expect("listener");
        subscribe(&connection, &mut server, SubscriptionMask::ALL).await;

        let injected: Vec<_> = (0..5)
            .map(|i| event(Facility::Sink, EventKind::Changed, i))
            .collect();
        for record in &injected {
            server.send_event(*record).await;
        }

        for expected in &injected {
            assert_eq!(first.next().await.unwrap().unwrap(), *expected);
        }
        for expected in &injected {
            assert_eq!(second.next().await.unwrap().unwrap(), *expected);
        }
    }

    #[tokio::test]
    async fn mask_gates_delivery() {
        let (_dir, connection, mut server) = connect_pair().await;

        let mut listener = connection.listen().await.expect("listener");
        subscribe(&connection, &mut server, SubscriptionMask::SINK).await;

        server.send_event(event(Facility::Card, EventKind::New, 7)).await;
        server.send_event(event(Facility::Sink, EventKind::Removed, 2)).await;

        // the card event was filtered: the sink event arrives first
        let received = listener.next().await.unwrap().unwrap();
        assert_eq!(received, event(Facility::Sink, EventKind::Removed, 2));
    }

    #[tokio::test]
    async fn new_mask_replaces_old_for_existing_listeners() {
        let (_dir, connection, mut server) = connect_pair().await;

        let mut listener = connection.listen().await.expect("listener");
        subscribe(&connection, &mut server, SubscriptionMask::SINK).await;
        subscribe(&connection, &mut server, SubscriptionMask::CARD).await;

        server.send_event(event(Facility::Sink, EventKind::Changed, 1)).await;
        server.send_event(event(Facility::Card, EventKind::Changed, 3)).await;

        let received = listener.next().await.unwrap().unwrap();
        assert_eq!(received, event(Facility::Card, EventKind::Changed, 3));
    }

    #[tokio::test]
    async fn dropping_one_listener_leaves_others_running() {
        let (_dir, connection, mut server) = connect_pair().await;

        let dropped = connection.listen().await.expect("listener");
        let mut kept = connection.listen().await.expect("listener");
        subscribe(&connection, &mut server, SubscriptionMask::ALL).await;

        drop(dropped);
        server.send_event(event(Facility::Source, EventKind::New, 11)).await;

        let received = kept.next().await.unwrap().unwrap();
        assert_eq!(received, event(Facility::Source, EventKind::New, 11));
    }
}

mod codec_contract {
    use super::*;

    #[test]
    fn command_round_trip() {
        let codec = LineCodec;
        let command = Command::SetSinkVolume {
            index: 3,
            volume: Volume::stereo(0.5, 0.75),
        };
        let bytes = codec.encode(Tag(9), &command).expect("encode");
        let (tag, decoded) = decode_client_frame(&bytes);
        assert_eq!(tag, Tag(9));
        assert_eq!(decoded, command);
    }

    #[test]
    fn reply_round_trip() {
        let codec = LineCodec;
        let reply = Reply::Sink(sink_fixture(4, "round"));
        let mut buf = encode_server_reply(Tag(12), reply.clone());
        let decoded = codec.decode(&mut buf).expect("decode").expect("frame");
        assert_eq!(
            decoded,
            Inbound::Reply {
                tag: Tag(12),
                reply
            }
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_input_is_not_a_frame() {
        let codec = LineCodec;
        let full = encode_server_reply(Tag(1), Reply::Ack);
        let mut partial = full[..full.len() - 1].to_vec();
        assert!(codec.decode(&mut partial).expect("decode").is_none());
        // nothing consumed until the frame completes
        assert_eq!(partial.len(), full.len() - 1);
    }
}
