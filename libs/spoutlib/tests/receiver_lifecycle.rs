// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Receiver lifecycle against the loopback bus.

use spoutlib::{
    ChannelInfo, ErrorCategory, GlFormat, GlTexture, LoopbackBus, Receiver, Sender, SpoutError,
    gl_constants::GL_TEXTURE_2D,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("spoutlib=trace")
        .with_test_writer()
        .try_init();
}

fn producer(bus: &LoopbackBus, name: &str, width: u32, height: u32) -> Sender<LoopbackBus> {
    let mut sender = Sender::new(bus.clone());
    sender.create(name, width, height).unwrap();
    sender
}

#[test]
fn test_create_without_producer_stays_unbound() {
    init_tracing();
    let bus = LoopbackBus::new();
    let mut receiver = Receiver::new(bus.clone());

    let err = receiver.create("prod-1", false).unwrap_err();
    assert!(matches!(err, SpoutError::ChannelNotFound(ref name) if name == "prod-1"));
    assert_eq!(err.category(), ErrorCategory::TransportRefusal);
    assert!(!receiver.is_bound());
    assert!(receiver.channel().is_none());

    // The failed attempt opened a transport object but never bound it.
    drop(receiver);
    assert_eq!(bus.stats().release_receiver, 0);
}

#[test]
fn test_create_reports_producer_dimensions() {
    init_tracing();
    let bus = LoopbackBus::new();
    let _producer = producer(&bus, "prod-1", 800, 600);

    let mut receiver = Receiver::new(bus.clone());
    let channel = receiver.create("prod-1", false).unwrap();
    assert_eq!(channel, ChannelInfo::new("prod-1", 800, 600));
    assert!(receiver.is_bound());
    assert_eq!(receiver.channel(), Some(&channel));
}

#[test]
fn test_drop_releases_exactly_once() {
    let bus = LoopbackBus::new();
    let _producer = producer(&bus, "prod-1", 800, 600);
    {
        let mut receiver = Receiver::new(bus.clone());
        receiver.create("prod-1", false).unwrap();
    }
    assert_eq!(bus.stats().release_receiver, 1);
}

#[test]
fn test_release_is_idempotent() {
    let bus = LoopbackBus::new();
    let _producer = producer(&bus, "prod-1", 8, 8);
    let mut receiver = Receiver::new(bus.clone());
    receiver.create("prod-1", false).unwrap();
    receiver.release();
    receiver.release();
    drop(receiver);
    assert_eq!(bus.stats().release_receiver, 1);
}

#[test]
fn test_recreate_after_release_matches_single_create() {
    let bus = LoopbackBus::new();
    let _producer = producer(&bus, "prod-1", 320, 200);

    let mut once = Receiver::new(bus.clone());
    once.create("prod-1", false).unwrap();

    let mut twice = Receiver::new(bus.clone());
    twice.create("prod-1", false).unwrap();
    twice.release();
    twice.create("prod-1", false).unwrap();

    assert_eq!(once.is_bound(), twice.is_bound());
    assert_eq!(once.channel(), twice.channel());
}

#[test]
fn test_create_while_bound_is_rejected() {
    let bus = LoopbackBus::new();
    let _a = producer(&bus, "a", 4, 4);
    let _b = producer(&bus, "b", 4, 4);

    let mut receiver = Receiver::new(bus.clone());
    receiver.create("a", false).unwrap();
    assert!(matches!(
        receiver.create("b", false),
        Err(SpoutError::AlreadyBound(name)) if name == "a"
    ));
    assert_eq!(receiver.channel().unwrap().name, "a");
    assert_eq!(bus.stats().create_receiver, 1);
}

#[test]
fn test_unbound_receiver_makes_no_transport_calls() {
    let bus = LoopbackBus::new();
    let _producer = producer(&bus, "prod-1", 4, 4);
    let before = bus.stats();

    let mut receiver = Receiver::new(bus.clone());
    let mut buf = [0u8; 64];
    assert!(matches!(
        receiver.receive_image("prod-1", &mut buf, GlFormat::RGBA, false, 0),
        Err(SpoutError::NotBound)
    ));
    let texture = GlTexture::new(1, GL_TEXTURE_2D);
    assert!(matches!(
        receiver.receive_texture("prod-1", texture, false, 0),
        Err(SpoutError::NotBound)
    ));
    assert!(matches!(
        receiver.get_image_size("prod-1"),
        Err(SpoutError::NotBound)
    ));
    receiver.release();
    drop(receiver);

    assert_eq!(bus.stats(), before);
}

#[test]
fn test_resolution_change_is_reported_then_recovered() {
    init_tracing();
    let bus = LoopbackBus::new();
    let mut sender = producer(&bus, "cam", 2, 2);
    sender
        .send_image(&[1; 16], 2, 2, GlFormat::RGBA, false, 0)
        .unwrap();

    let mut receiver = Receiver::new(bus.clone());
    receiver.create("cam", false).unwrap();
    let mut small = vec![0u8; 16];
    receiver
        .receive_image("", &mut small, GlFormat::RGBA, false, 0)
        .unwrap();

    sender.update("cam", 4, 2).unwrap();
    sender
        .send_image(&[2; 32], 4, 2, GlFormat::RGBA, false, 0)
        .unwrap();

    let err = receiver
        .receive_image("", &mut small, GlFormat::RGBA, false, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        SpoutError::ResolutionChanged {
            width: 4,
            height: 2,
            ..
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Transient);
    assert_eq!(receiver.channel().unwrap().dimensions(), (4, 2));

    // The old buffer is now too small for the tracked size.
    assert!(matches!(
        receiver.receive_image("", &mut small, GlFormat::RGBA, false, 0),
        Err(SpoutError::BufferTooSmall { required: 32, .. })
    ));

    let mut resized = vec![0u8; 32];
    let outcome = receiver
        .receive_image("", &mut resized, GlFormat::RGBA, false, 0)
        .unwrap();
    assert!(!outcome.resized);
    assert_eq!(resized, vec![2; 32]);
}

#[test]
fn test_active_sender_is_followed() {
    let bus = LoopbackBus::new();
    let first = producer(&bus, "first", 4, 4);
    let _second = producer(&bus, "second", 8, 8);

    let mut receiver = Receiver::new(bus.clone());
    let channel = receiver.create("", true).unwrap();
    assert_eq!(channel.name, "first");

    drop(first);
    let outcome = receiver.receive_texture("", None, false, 0).unwrap();
    assert_eq!(outcome.channel, ChannelInfo::new("second", 8, 8));
    assert!(outcome.resized);
    assert_eq!(receiver.channel().unwrap().name, "second");
}

#[test]
fn test_poll_fails_once_every_producer_is_gone() {
    let bus = LoopbackBus::new();
    let sender = producer(&bus, "cam", 4, 4);
    let mut receiver = Receiver::new(bus.clone());
    receiver.create("cam", false).unwrap();
    drop(sender);

    assert!(matches!(
        receiver.receive_texture("", None, false, 0),
        Err(SpoutError::NoFrame(name)) if name == "cam"
    ));
    assert!(receiver.is_bound());
}
