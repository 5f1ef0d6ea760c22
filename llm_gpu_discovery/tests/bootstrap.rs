//! Device bootstrap, properties and fault-fencing integration tests.

mod common;
use common::*;
use llm_gpu_discovery::*;
use serial_test::serial;

#[test]
#[serial]
fn bootstrap_reports_memory() -> ProbeResult<()> {
    let (_loader, mut handle) = mock_handle(
        Vendor::Musa,
        vec![
            MockDevice::new(8 * GB, 6 * GB),
            MockDevice::new(16 * GB, 4 * GB),
        ],
    );

    let memory = handle.bootstrap(0)?;

    assert_eq!(
        memory,
        MemoryReport {
            total: 8_000_000_000,
            free: 6_000_000_000,
            used: 2_000_000_000,
        }
    );
    let second = handle.bootstrap(1)?;
    assert_eq!(second.used, second.total - second.free);
    assert_eq!(second.used, 12_000_000_000);
    Ok(())
}

#[test]
#[serial]
fn bootstrap_selects_the_device_before_reading_memory() -> ProbeResult<()> {
    let (_loader, mut handle) = mock_handle(Vendor::Musa, vec![MockDevice::new(8 * GB, 6 * GB)]);
    state(Slot::A).calls.clear();

    handle.bootstrap(0)?;

    assert_eq!(calls(Slot::A), vec!["set_device", "mem_get_info"]);
    Ok(())
}

#[test]
#[serial]
fn bootstrap_out_of_range_calls_nothing() {
    let (_loader, mut handle) = mock_handle(
        Vendor::Musa,
        vec![
            MockDevice::new(8 * GB, 6 * GB),
            MockDevice::new(8 * GB, 6 * GB),
        ],
    );
    let before = calls(Slot::A);

    for index in [2, 3, u32::MAX] {
        let err = handle.bootstrap(index).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::DeviceOutOfRange {
                device_count: 2,
                ..
            }
        ));
        assert_eq!(err.class(), StatusClass::Misuse);
    }
    assert!(handle.properties(2).is_err());
    assert!(handle.synchronize(2).is_err());
    assert!(handle.reset_device(2).is_err());
    assert_eq!(calls(Slot::A), before);
}

#[test]
#[serial]
fn bootstrap_rejects_free_above_total() {
    let (_loader, mut handle) = mock_handle(Vendor::Musa, vec![MockDevice::new(4 * GB, 6 * GB)]);

    let err = handle.bootstrap(0).unwrap_err();

    assert!(matches!(
        err,
        ProbeError::InconsistentMemory {
            index: 0,
            free: 6_000_000_000,
            total: 4_000_000_000,
            ..
        }
    ));
}

#[test]
#[serial]
fn bootstrap_surfaces_selection_failure_without_fencing() {
    let (_loader, mut handle) = mock_handle(Vendor::Musa, vec![MockDevice::new(8 * GB, 6 * GB)]);
    state(Slot::A).set_device_status = INVALID_VALUE;

    let err = handle.bootstrap(0).unwrap_err();

    assert_eq!(err.class(), StatusClass::Misuse);
    match &err {
        ProbeError::Vendor { operation, status } => {
            assert_eq!(*operation, "set_device");
            assert_eq!(status.code, INVALID_VALUE);
        }
        other => panic!("expected a vendor error, got {other}"),
    }
    assert!(handle.fault(0).is_none());

    state(Slot::A).set_device_status = OK;
    assert!(handle.bootstrap(0).is_ok());
}

#[test]
#[serial]
fn device_fault_is_cached_until_reset() {
    let mut faulty = MockDevice::new(8 * GB, 6 * GB);
    faulty.mem_status = ILLEGAL_ADDRESS;
    let (_loader, mut handle) =
        mock_handle(Vendor::Musa, vec![faulty, MockDevice::new(8 * GB, 2 * GB)]);

    let first = handle.bootstrap(0).unwrap_err();
    assert_eq!(first.class(), StatusClass::DeviceFault);
    let status = first.status().cloned().unwrap();
    assert_eq!(status.name, "IllegalAddress");
    assert_eq!(handle.fault(0), Some(&status));

    let calls_after_fault = calls(Slot::A);
    let second = handle.bootstrap(0).unwrap_err();
    match &second {
        ProbeError::DeviceUnusable { index, status: s, .. } => {
            assert_eq!(*index, 0);
            assert_eq!(s, &status);
        }
        other => panic!("expected an unusable device error, got {other}"),
    }
    assert_eq!(second.class(), StatusClass::DeviceFault);
    assert!(matches!(
        handle.properties(0),
        Err(ProbeError::DeviceUnusable { .. })
    ));
    assert!(matches!(
        handle.attribute(0, DeviceAttribute::WarpSize),
        Err(ProbeError::DeviceUnusable { .. })
    ));
    assert!(matches!(
        handle.synchronize(0),
        Err(ProbeError::DeviceUnusable { .. })
    ));
    assert_eq!(calls(Slot::A), calls_after_fault, "fenced device was called");

    // The sibling device is unaffected.
    assert_eq!(handle.bootstrap(1).unwrap().free, 2_000_000_000);

    handle.reset_device(0).unwrap();
    assert!(handle.fault(0).is_none());
    assert_eq!(handle.bootstrap(0).unwrap().used, 2_000_000_000);
}

#[test]
#[serial]
fn reset_recovers_a_device_whose_selection_reports_the_fault() {
    let mut faulty = MockDevice::new(8 * GB, 6 * GB);
    faulty.mem_status = ILLEGAL_ADDRESS;
    let (_loader, mut handle) = mock_handle(Vendor::Cuda, vec![faulty]);
    assert_eq!(
        handle.bootstrap(0).unwrap_err().class(),
        StatusClass::DeviceFault
    );
    // The runtime now reports the sticky fault from every selection.
    state(Slot::A).set_device_status = ILLEGAL_ADDRESS;
    state(Slot::A).calls.clear();

    handle.reset_device(0).unwrap();

    assert_eq!(calls(Slot::A), vec!["set_device", "device_reset"]);
    assert!(handle.fault(0).is_none());
    assert_eq!(handle.bootstrap(0).unwrap().used, 2_000_000_000);
}

#[test]
#[serial]
fn reset_of_a_healthy_device_stops_at_failed_selection() {
    let (_loader, mut handle) = mock_handle(Vendor::Cuda, vec![MockDevice::new(8 * GB, 6 * GB)]);
    state(Slot::A).set_device_status = INVALID_VALUE;
    state(Slot::A).calls.clear();

    let err = handle.reset_device(0).unwrap_err();

    assert_eq!(err.class(), StatusClass::Misuse);
    assert_eq!(calls(Slot::A), vec!["set_device"]);
}

#[test]
#[serial]
fn synchronize_selects_then_synchronizes() -> ProbeResult<()> {
    let (_loader, mut handle) = mock_handle(Vendor::Musa, vec![MockDevice::new(8 * GB, 6 * GB)]);
    state(Slot::A).calls.clear();

    handle.synchronize(0)?;

    assert_eq!(calls(Slot::A), vec!["set_device", "device_synchronize"]);
    Ok(())
}

#[test]
#[serial]
fn full_properties_are_read_from_the_struct() -> ProbeResult<()> {
    let mut device = MockDevice::new(8 * GB, 6 * GB);
    device.name = "MTT S4000";
    device.multi_processor_count = 48;
    device.uuid = [
        0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd,
        0xef,
    ];
    let (_loader, mut handle) = mock_handle(Vendor::Musa, vec![device]);
    state(Slot::A).calls.clear();

    let props = handle.properties(0)?;

    assert_eq!(props.name, "MTT S4000");
    assert_eq!((props.compute_major, props.compute_minor), (2, 1));
    assert_eq!(props.total_global_mem, 8_000_000_000);
    assert_eq!(props.multi_processor_count, 48);
    assert_eq!(props.memory_bus_width, 256);
    assert_eq!(
        props.uuid_string().as_deref(),
        Some("GPU-12345678-9abc-def0-0123-456789abcdef")
    );
    assert_eq!(calls(Slot::A), vec!["get_device_properties"]);
    Ok(())
}

#[test]
#[serial]
fn prefix_properties_are_filled_from_attributes() -> ProbeResult<()> {
    let mut device = MockDevice::new(8 * GB, 6 * GB);
    device.multi_processor_count = 48;
    let (_loader, mut handle) = mock_handle(
        Vendor::Cuda,
        vec![MockDevice::new(8 * GB, 6 * GB), device],
    );

    let props = handle.properties(1)?;

    let spec = Vendor::Cuda.spec();
    let expected = |attribute| spec.attribute_code(attribute).unwrap() + 1000;
    assert_eq!((props.compute_major, props.compute_minor), (2, 1));
    assert_eq!(props.warp_size, 32);
    assert_eq!(
        props.multi_processor_count,
        expected(DeviceAttribute::MultiProcessorCount)
    );
    assert_eq!(
        props.memory_bus_width,
        expected(DeviceAttribute::GlobalMemoryBusWidth)
    );
    assert_eq!(props.pci_bus_id, expected(DeviceAttribute::PciBusId));
    assert!(props.ecc_enabled);
    Ok(())
}

#[test]
#[serial]
fn hip_properties_are_decoded_from_the_hip_layout() -> ProbeResult<()> {
    let mut device = MockDevice::new(192 * GB, 190 * GB);
    device.name = "AMD Instinct MI300X";
    device.major = 9;
    device.minor = 4;
    let (_loader, mut handle) = mock_handle(Vendor::Rocm, vec![device]);

    let props = handle.properties(0)?;

    let spec = Vendor::Rocm.spec();
    assert_eq!(props.name, "AMD Instinct MI300X");
    assert_eq!((props.compute_major, props.compute_minor), (9, 4));
    assert_eq!(props.total_global_mem, 192_000_000_000);
    assert_eq!(props.warp_size, 64);
    assert_eq!(props.uuid_string(), None);
    assert_eq!(
        props.multi_processor_count,
        spec.attribute_code(DeviceAttribute::MultiProcessorCount).unwrap()
    );
    Ok(())
}

#[test]
#[serial]
fn hip_devices_are_discovered_without_an_id() -> anyhow::Result<()> {
    reset(Slot::A, MockState::with_devices(vec![MockDevice::new(64 * GB, 60 * GB)]));
    let loader = std::sync::Arc::new(
        MockLoader::new().with_runtime(ROCM_PATH, Vendor::Rocm, Slot::A),
    );

    let report = ProbeConfig::new()
        .vendors([VendorCandidate::new(Vendor::Rocm).library_path(ROCM_PATH)])
        .probe_host(false)
        .probe_with(loader)?;

    assert_eq!(report.devices.len(), 1);
    assert_eq!(report.devices[0].id, None);
    assert_eq!(report.devices[0].properties.total_global_mem, 64_000_000_000);
    Ok(())
}

#[test]
#[serial]
fn properties_failure_is_a_classified_error() {
    let mut device = MockDevice::new(8 * GB, 6 * GB);
    device.properties_status = INVALID_VALUE;
    let (_loader, mut handle) = mock_handle(Vendor::Musa, vec![device]);

    let err = handle.properties(0).unwrap_err();

    assert_eq!(err.class(), StatusClass::Misuse);
    assert_eq!(err.status().unwrap().code, INVALID_VALUE);
}

#[test]
#[serial]
fn attribute_query_uses_vendor_numbering() -> ProbeResult<()> {
    let (_loader, mut handle) = mock_handle(Vendor::Rocm, vec![MockDevice::new(8 * GB, 6 * GB)]);

    let width = handle.attribute(0, DeviceAttribute::GlobalMemoryBusWidth)?;

    assert_eq!(width, 59);
    Ok(())
}

#[test]
#[serial]
fn unsupported_attribute_is_misuse_without_a_call() {
    let (_loader, mut handle) = mock_handle(Vendor::Rocm, vec![MockDevice::new(8 * GB, 6 * GB)]);
    let before = calls(Slot::A);

    let err = handle.attribute(0, DeviceAttribute::WarpSize).unwrap_err();

    assert!(matches!(
        err,
        ProbeError::AttributeUnsupported {
            attribute: "WarpSize",
            ..
        }
    ));
    assert_eq!(err.class(), StatusClass::Misuse);
    assert_eq!(calls(Slot::A), before);
}
