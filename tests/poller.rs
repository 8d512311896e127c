use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use iomux::{Interest, Poller, PollerConfig, Readiness, Token};

fn new_poller(timeout: Option<Duration>) -> Poller {
    Poller::new(PollerConfig {
        capacity: 64,
        timeout,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn create_and_drop_releases_the_handle() {
    // A leaked native handle per iteration would blow through the default
    // descriptor limit long before the loop ends.
    for _ in 0..4096 {
        let poller = new_poller(Some(Duration::ZERO));
        assert_eq!(poller.capacity(), 64);
    }
}

#[test]
fn zero_capacity_is_rejected() {
    let result = Poller::new(PollerConfig {
        capacity: 0,
        ..Default::default()
    });
    assert!(result.is_err());
}

#[test]
fn reports_readable_with_the_attached_token() {
    let mut poller = new_poller(Some(Duration::from_secs(5)));
    let (mut tx, rx) = UnixStream::pair().unwrap();

    poller
        .attach(rx.as_raw_fd(), Interest::READABLE, Token(7))
        .unwrap();
    tx.write_all(b"ping").unwrap();

    let ready = poller.wait().unwrap();
    assert_eq!(ready, 1);

    let event = poller.event(0);
    assert_eq!(event.token, Token(7));
    assert!(event.readiness.contains(Readiness::READABLE));
}

#[test]
fn detached_descriptor_stays_silent() {
    let mut poller = new_poller(Some(Duration::ZERO));
    let (mut tx, rx) = UnixStream::pair().unwrap();

    poller
        .attach(rx.as_raw_fd(), Interest::READABLE | Interest::WRITABLE, Token(1))
        .unwrap();
    poller.detach(rx.as_raw_fd()).unwrap();

    tx.write_all(b"ping").unwrap();
    assert_eq!(poller.wait().unwrap(), 0);
}

#[test]
fn modify_removes_stale_write_interest() {
    let mut poller = new_poller(Some(Duration::ZERO));
    let (_tx, rx) = UnixStream::pair().unwrap();

    // The socket is writable from the start, so write interest left over
    // from attach would fire immediately.
    poller
        .attach(rx.as_raw_fd(), Interest::READABLE | Interest::WRITABLE, Token(1))
        .unwrap();
    poller
        .modify(rx.as_raw_fd(), Interest::READABLE, Token(1))
        .unwrap();

    let ready = poller.wait().unwrap();
    for event in poller.events() {
        assert!(!event.readiness.contains(Readiness::WRITABLE));
    }
    assert_eq!(ready, 0);
}

#[test]
fn modify_replaces_the_token() {
    let mut poller = new_poller(Some(Duration::from_secs(5)));
    let (mut tx, rx) = UnixStream::pair().unwrap();

    poller
        .attach(rx.as_raw_fd(), Interest::READABLE, Token(1))
        .unwrap();
    poller
        .modify(rx.as_raw_fd(), Interest::READABLE, Token(2))
        .unwrap();

    tx.write_all(b"ping").unwrap();
    assert_eq!(poller.wait().unwrap(), 1);
    assert_eq!(poller.event(0).token, Token(2));
}

#[test]
fn zero_timeout_returns_promptly_when_idle() {
    let mut poller = new_poller(Some(Duration::ZERO));
    let (_tx, rx) = UnixStream::pair().unwrap();
    poller
        .attach(rx.as_raw_fd(), Interest::READABLE, Token(1))
        .unwrap();

    let start = Instant::now();
    assert_eq!(poller.wait().unwrap(), 0);
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[test]
fn positive_timeout_elapses_to_an_empty_result() {
    let mut poller = new_poller(Some(Duration::from_millis(50)));
    let (_tx, rx) = UnixStream::pair().unwrap();
    poller
        .attach(rx.as_raw_fd(), Interest::READABLE, Token(1))
        .unwrap();

    let start = Instant::now();
    assert_eq!(poller.wait().unwrap(), 0);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(40), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "returned after {:?}", elapsed);
}

#[test]
fn peer_close_reports_hangup() {
    let mut poller = new_poller(Some(Duration::from_secs(5)));
    let (tx, rx) = UnixStream::pair().unwrap();

    poller
        .attach(rx.as_raw_fd(), Interest::READABLE, Token(3))
        .unwrap();
    drop(tx);

    let ready = poller.wait().unwrap();
    assert_eq!(ready, 1);

    let event = poller.event(0);
    assert_eq!(event.token, Token(3));
    assert!(
        event.readiness.contains(Readiness::HUNGUP),
        "got {:?}",
        event.readiness
    );
}

#[test]
fn detach_of_an_unregistered_descriptor_is_benign() {
    let mut poller = new_poller(Some(Duration::ZERO));
    let (_tx, rx) = UnixStream::pair().unwrap();
    poller.detach(rx.as_raw_fd()).unwrap();
}

#[test]
fn capacity_bounds_a_single_wait() {
    let mut poller = Poller::new(PollerConfig {
        capacity: 2,
        timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    })
    .unwrap();

    let mut pairs = Vec::new();
    for token in 0..4usize {
        let (mut tx, rx) = UnixStream::pair().unwrap();
        poller
            .attach(rx.as_raw_fd(), Interest::READABLE, Token(token))
            .unwrap();
        tx.write_all(b"ping").unwrap();
        pairs.push((tx, rx));
    }

    assert_eq!(poller.wait().unwrap(), 2);
}

#[test]
fn combined_interest_reports_both_directions() {
    let (raw_tx, raw_rx) =
        socket2::Socket::pair(socket2::Domain::unix(), socket2::Type::stream(), None).unwrap();
    raw_rx.set_nonblocking(true).unwrap();

    let mut poller = new_poller(Some(Duration::from_secs(5)));
    poller
        .attach(
            raw_rx.as_raw_fd(),
            Interest::READABLE | Interest::WRITABLE,
            Token(9),
        )
        .unwrap();
    raw_tx.send(b"ping").unwrap();

    // Backends with per-direction filters may deliver one entry per
    // direction; the union is what the contract promises.
    let ready = poller.wait().unwrap();
    assert!(ready >= 1);

    let mut seen = Readiness::empty();
    for event in poller.events() {
        assert_eq!(event.token, Token(9));
        seen |= event.readiness;
    }
    assert!(seen.contains(Readiness::READABLE));
    assert!(seen.contains(Readiness::WRITABLE));
}
