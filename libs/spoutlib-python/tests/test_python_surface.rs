// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Drives the bindings from Python source, the way a host script would.
//!
//! These tests exercise argument defaults, keyword names, buffer-protocol
//! conversion and `ChannelStatus` truthiness, which the Rust-side unit tests
//! cannot see.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use spoutlib_python::{PyChannelStatus, PyLoopbackBus, PyReceiver, PySender};

fn run(script: &std::ffi::CStr) {
    Python::attach(|py| {
        let globals = PyDict::new(py);
        globals
            .set_item("Sender", py.get_type::<PySender>())
            .unwrap();
        globals
            .set_item("Receiver", py.get_type::<PyReceiver>())
            .unwrap();
        globals
            .set_item("LoopbackBus", py.get_type::<PyLoopbackBus>())
            .unwrap();
        globals
            .set_item("ChannelStatus", py.get_type::<PyChannelStatus>())
            .unwrap();
        globals.set_item("GL_RGBA", 0x1908u32).unwrap();
        globals.set_item("GL_TEXTURE_2D", 0x0DE1u32).unwrap();

        if let Err(e) = py.run(script, Some(&globals), None) {
            e.print(py);
            panic!("script failed: {}", e);
        }
    });
}

#[test]
fn test_sender_surface() {
    run(c"
bus = LoopbackBus()
s = Sender(bus=bus)
assert s.is_bound is False
assert s.name is None and s.width is None and s.height is None
assert s.send_image(b'\\x00' * 16, 2, 2, GL_RGBA) is False
assert bus.call_count == 0

assert s.create('chan-a', 2, 2) is True
assert (s.name, s.width, s.height) == ('chan-a', 2, 2)
assert s.send_image(bytes(16), 2, 2, GL_RGBA) is True
assert s.send_image(memoryview(bytearray(16)), 2, 2, GL_RGBA, invert=True) is True
assert s.send_texture(5, GL_TEXTURE_2D, 2, 2) is True
assert s.update('chan-a', 4, 4) is True
s.release()
s.release()
assert s.is_bound is False
");
}

#[test]
fn test_receiver_surface() {
    run(c"
bus = LoopbackBus(memory_mode=True)
s = Sender(bus=bus)
r = Receiver(bus=bus)

status = r.create('prod-1')
assert not status
assert isinstance(status, ChannelStatus)
assert (status.name, status.width, status.height) == ('prod-1', 0, 0)

assert s.create('prod-1', 800, 600)
status = r.create('prod-1')
assert status and status.ok
assert (status.name, status.width, status.height) == ('prod-1', 800, 600)

frame = bytes(range(256)) * (800 * 600 * 4 // 256)
assert s.send_image(frame, 800, 600, GL_RGBA)
pixels = bytearray(800 * 600 * 4)
assert r.receive_image('', 800, 600, pixels)
assert bytes(pixels) == frame

assert r.receive_texture('prod-1')
size = r.get_image_size('prod-1')
assert size and size.memory_mode is True

try:
    r.receive_image('', 800, 600, frame)
except ValueError:
    pass
else:
    raise AssertionError('read-only buffer accepted')

r.release()
assert not r.receive_texture('prod-1')
");
}

#[test]
fn test_resize_is_reported_until_caller_resizes() {
    run(c"
bus = LoopbackBus()
s = Sender(bus=bus)
r = Receiver(bus=bus)
assert s.create('cam', 1, 1)
assert r.create('cam')
assert s.update('cam', 2, 1)
assert s.send_image(bytes(range(8)), 2, 1, GL_RGBA)

stale = bytearray(4)
first = r.receive_image('cam', 1, 1, stale)
second = r.receive_image('cam', 1, 1, stale)
assert not first and not second
assert (first.width, first.height) == (2, 1)
assert (second.width, second.height) == (2, 1)

pixels = bytearray(second.width * second.height * 4)
status = r.receive_image('cam', second.width, second.height, pixels)
assert status and bytes(pixels) == bytes(range(8))
");
}
