mod common;

use common::*;
use ferrous_ioc::global::{self, DEFAULT_CONTAINER_NAME};
use ferrous_ioc::{Container, DiError, Resolver};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
#[serial]
fn test_init_and_get() {
    global::teardown().unwrap();
    assert!(!global::is_initialized());
    assert!(matches!(global::get(), Err(DiError::ContainerNotFound(_))));

    let container = global::init(Container::builder().catalog(shared_catalog())).unwrap();

    assert!(global::is_initialized());
    assert_eq!(container.name(), DEFAULT_CONTAINER_NAME);
    assert!(global::get().unwrap().ptr_eq(&container));
    assert!(Container::named(DEFAULT_CONTAINER_NAME).unwrap().ptr_eq(&container));

    global::teardown().unwrap();
}

#[test]
#[serial]
fn test_builder_name_is_replaced() {
    let container = global::init(Container::builder().name(unique_name("ignored"))).unwrap();
    assert_eq!(container.name(), DEFAULT_CONTAINER_NAME);
    global::teardown().unwrap();
}

#[test]
#[serial]
fn test_reinit_disposes_previous() {
    let disposed = Arc::new(AtomicUsize::new(0));
    global::init(Container::builder()).unwrap();
    global::get()
        .unwrap()
        .register_instance(Tracked::new(&disposed), None)
        .unwrap()
        .dispose_with::<Tracked>();

    let fresh = global::init(Container::builder()).unwrap();

    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert_eq!(fresh.registration_count(), 0);
    global::teardown().unwrap();
}

#[test]
#[serial]
fn test_teardown_releases_everything() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let container = global::init(Container::builder().catalog(shared_catalog())).unwrap();
    container
        .register_instance(Tracked::new(&disposed), None)
        .unwrap()
        .dispose_with::<Tracked>();
    container.resolve::<Tracked>().unwrap();

    global::teardown().unwrap();

    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert!(global::get().is_err());
    assert!(Container::named(DEFAULT_CONTAINER_NAME).is_err());
    // A second teardown is a no-op
    global::teardown().unwrap();
}
