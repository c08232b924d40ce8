//! Module load/teardown and isolation tests
//!
//! Each load owns a freshly created type descriptor. Loads never share
//! descriptor identity, instances belong to the load that created them,
//! and teardown releases exactly what the load acquired.

use radical_engine::{CallArgs, ObjRef, Runtime};
use radical_field as field;

fn load(rt: &mut Runtime) -> (ObjRef, ObjRef) {
    let module = field::init(rt).expect("load failed");
    let ty = field::resolve_type(rt, module).expect("type not published");
    (module, ty)
}

#[test]
fn test_init_publishes_the_type() {
    let mut rt = Runtime::new();
    let module = field::init(&mut rt).unwrap();

    assert_eq!(rt.module_name(module), Some(field::MODULE_NAME));

    let ty = field::resolve_type(&rt, module).unwrap();
    let element = rt.construct(ty, &CallArgs::new()).unwrap();
    assert!(rt.is_instance(element, ty));

    rt.dec_ref(element);
    rt.dec_ref(ty);
    rt.unload(module);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn test_two_loads_never_share_descriptors() {
    let mut rt = Runtime::new();
    let (m1, t1) = load(&mut rt);
    let (m2, t2) = load(&mut rt);

    assert_ne!(t1, t2);

    // Instances belong to the load that created them.
    let e1 = rt.construct(t1, &CallArgs::new()).unwrap();
    let e2 = rt.construct(t2, &CallArgs::new()).unwrap();
    assert!(rt.is_instance(e1, t1));
    assert!(rt.is_instance(e2, t2));
    assert!(!rt.is_instance(e1, t2));
    assert!(!rt.is_instance(e2, t1));

    rt.dec_ref(e1);
    rt.dec_ref(e2);
    rt.dec_ref(t1);
    rt.dec_ref(t2);
    rt.unload(m1);
    rt.unload(m2);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn test_unload_releases_only_its_own_load() {
    let mut rt = Runtime::new();
    let (m1, t1) = load(&mut rt);
    let (m2, t2) = load(&mut rt);

    rt.dec_ref(t2);
    rt.unload(m2);

    // The first load is untouched and still constructs.
    let element = rt.construct(t1, &CallArgs::new()).unwrap();
    assert!(rt.is_instance(element, t1));

    rt.dec_ref(element);
    rt.dec_ref(t1);
    rt.unload(m1);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn test_descriptor_outlives_its_module_while_instances_remain() {
    let mut rt = Runtime::new();
    let (module, ty) = load(&mut rt);

    let element = rt.construct(ty, &CallArgs::new()).unwrap();

    // Drop every reference to the descriptor except the instance's own.
    rt.dec_ref(ty);
    rt.unload(module);
    assert!(rt.is_live(ty));

    // The instance keeps working against its descriptor.
    let a = rt.get_attr(element, "a").unwrap();
    assert_eq!(rt.int_value(a), Some(0));
    rt.dec_ref(a);

    // Destroying the last instance takes the descriptor with it.
    rt.dec_ref(element);
    assert_eq!(rt.live_objects(), 0);
}

#[test]
fn test_loads_in_separate_runtimes_are_isolated() {
    let mut rt1 = Runtime::new();
    let mut rt2 = Runtime::new();

    let (m1, t1) = load(&mut rt1);
    let (m2, t2) = load(&mut rt2);

    let element = rt1.construct(t1, &CallArgs::new()).unwrap();
    assert_eq!(rt2.live_objects(), 2);

    rt1.dec_ref(element);
    rt1.dec_ref(t1);
    rt1.unload(m1);
    rt2.dec_ref(t2);
    rt2.unload(m2);
    assert_eq!(rt1.live_objects(), 0);
    assert_eq!(rt2.live_objects(), 0);
}
