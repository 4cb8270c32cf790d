//! Device selection predicates and the pipeline that applies them.
//!
//! A selector is a filter over a candidate device list. Callers compose
//! selectors into an ordered chain; each selector only sees the survivors
//! of the previous one, so chain order is semantically meaningful:
//! "keep GPUs, drop bad integrated parts, keep the fastest" reads in
//! exactly the order it runs.

use opal_backend::DeviceType;

use crate::device::Device;

/// A filtering/ranking predicate over a candidate device list.
///
/// `init` runs once per pipeline stage with the full current candidate
/// list, letting a selector compute an aggregate (the maximum speed, say)
/// before `selected` is asked about each device individually.
pub trait DeviceSelector {
    /// Observes the current candidate list before filtering.
    fn init(&mut self, _candidates: &[Device]) {}

    /// Returns `true` to keep the device.
    fn selected(&self, device: &Device) -> bool;
}

/// Applies selectors in order, narrowing `candidates` stage by stage.
///
/// Filtering stops as soon as exactly one candidate remains, even if
/// selectors are left: a single survivor is the answer regardless. This
/// also means a later selector is not guaranteed to run at all, so
/// selectors should not carry side effects callers depend on.
///
/// The surviving list preserves enumeration order; it may be empty.
pub(crate) fn run_pipeline(
    mut candidates: Vec<Device>,
    selectors: &mut [Box<dyn DeviceSelector>],
) -> Vec<Device> {
    for selector in selectors.iter_mut() {
        if candidates.len() == 1 {
            break;
        }
        selector.init(&candidates);
        candidates.retain(|device| selector.selected(device));
    }
    candidates
}

/// Keeps devices whose reported type is in the requested set.
#[derive(Clone, Debug)]
pub struct DeviceTypeSelector {
    types: Vec<DeviceType>,
}

impl DeviceTypeSelector {
    /// Keeps GPU devices.
    pub fn gpu() -> Self {
        Self {
            types: vec![DeviceType::Gpu],
        }
    }

    /// Keeps CPU devices.
    pub fn cpu() -> Self {
        Self {
            types: vec![DeviceType::Cpu],
        }
    }

    /// Keeps devices of any of the given types.
    pub fn any_of(types: Vec<DeviceType>) -> Self {
        Self { types }
    }
}

impl DeviceSelector for DeviceTypeSelector {
    fn selected(&self, device: &Device) -> bool {
        self.types.contains(&device.device_type())
    }
}

/// Rejects devices whose name matches known-problematic integrated GPUs.
///
/// Matching is by substring on the lowercased vendor/name string. The
/// relaxed variant tolerates the Iris line, which is adequate for real
/// work, while still rejecting the unusably slow integrated parts.
#[derive(Clone, Copy, Debug)]
pub enum BadDeviceSelector {
    /// Rejects every known integrated Intel GPU, Iris included.
    NotIntegratedIntel,
    /// Rejects slow integrated Intel GPUs but lets Iris through.
    NotSlowIntegratedIntel,
}

fn integrated_intel(name: &str) -> bool {
    name.contains("intel")
        && (name.contains("hd graphics")
            || name.contains("uhd graphics")
            || name.contains("iris")
            || name.contains("integrated"))
}

impl DeviceSelector for BadDeviceSelector {
    fn selected(&self, device: &Device) -> bool {
        let name = device.name().to_ascii_lowercase();
        match self {
            BadDeviceSelector::NotIntegratedIntel => !integrated_intel(&name),
            BadDeviceSelector::NotSlowIntegratedIntel => {
                !integrated_intel(&name) || name.contains("iris")
            }
        }
    }
}

/// Keeps the devices with the maximum speed metric.
///
/// Ties keep every tied device; enumeration order disambiguates when the
/// caller takes the first.
#[derive(Clone, Copy, Debug, Default)]
pub struct FastestDeviceSelector {
    max_speed: Option<u64>,
}

impl FastestDeviceSelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceSelector for FastestDeviceSelector {
    fn init(&mut self, candidates: &[Device]) {
        self.max_speed = candidates.iter().map(Device::speed).max();
    }

    fn selected(&self, device: &Device) -> bool {
        Some(device.speed()) == self.max_speed
    }
}

/// Keeps the devices with the maximum global memory size.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalMemorySelector {
    max_memory: Option<u64>,
}

impl GlobalMemorySelector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceSelector for GlobalMemorySelector {
    fn init(&mut self, candidates: &[Device]) {
        self.max_memory = candidates.iter().map(Device::global_memory).max();
    }

    fn selected(&self, device: &Device) -> bool {
        Some(device.global_memory()) == self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opal::Opal;
    use opal_backend::{MockBackend, MockDevice};
    use std::sync::Arc;

    fn devices(specs: Vec<MockDevice>) -> Vec<Device> {
        let backend = MockBackend::new().with_platform("p", specs);
        Opal::new(Arc::new(backend)).all_devices().unwrap()
    }

    #[test]
    fn test_type_selector() {
        let all = devices(vec![
            MockDevice::cpu("c"),
            MockDevice::gpu("g0"),
            MockDevice::gpu("g1"),
        ]);

        let gpu = DeviceTypeSelector::gpu();
        let kept: Vec<_> = all.iter().filter(|d| gpu.selected(d)).collect();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.device_type() == DeviceType::Gpu));

        let cpu = DeviceTypeSelector::cpu();
        assert!(cpu.selected(&all[0]));
        assert!(!cpu.selected(&all[1]));
    }

    #[test]
    fn test_bad_device_selector() {
        let all = devices(vec![
            MockDevice::gpu("NVIDIA GeForce RTX 3080"),
            MockDevice::gpu("Intel(R) HD Graphics 530"),
            MockDevice::gpu("Intel(R) Iris(TM) Graphics 6100"),
        ]);

        let strict = BadDeviceSelector::NotIntegratedIntel;
        assert!(strict.selected(&all[0]));
        assert!(!strict.selected(&all[1]));
        assert!(!strict.selected(&all[2]));

        let relaxed = BadDeviceSelector::NotSlowIntegratedIntel;
        assert!(relaxed.selected(&all[0]));
        assert!(!relaxed.selected(&all[1]));
        assert!(relaxed.selected(&all[2]));
    }

    #[test]
    fn test_fastest_unique_max() {
        let all = devices(vec![
            MockDevice::gpu("slow").compute_units(10).clock_frequency_mhz(100),
            MockDevice::gpu("fast").compute_units(50).clock_frequency_mhz(100),
        ]);

        let mut fastest = FastestDeviceSelector::new();
        let mut selectors: Vec<Box<dyn DeviceSelector>> = vec![Box::new(fastest)];
        let survivors = run_pipeline(all.clone(), &mut selectors);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].name(), "fast");

        // Direct trait usage keeps the same answer.
        fastest.init(&all);
        assert!(!fastest.selected(&all[0]));
        assert!(fastest.selected(&all[1]));
    }

    #[test]
    fn test_fastest_ties_keep_enumeration_order() {
        let all = devices(vec![
            MockDevice::gpu("a").compute_units(50).clock_frequency_mhz(100),
            MockDevice::gpu("b").compute_units(10).clock_frequency_mhz(100),
            MockDevice::gpu("c").compute_units(50).clock_frequency_mhz(100),
        ]);

        let mut selectors: Vec<Box<dyn DeviceSelector>> =
            vec![Box::new(FastestDeviceSelector::new())];
        let survivors = run_pipeline(all, &mut selectors);
        let names: Vec<_> = survivors.iter().map(Device::name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_global_memory_output_is_max_subset() {
        let all = devices(vec![
            MockDevice::gpu("small").global_memory(4 << 30),
            MockDevice::gpu("big").global_memory(16 << 30),
            MockDevice::gpu("big2").global_memory(16 << 30),
        ]);

        let mut selectors: Vec<Box<dyn DeviceSelector>> =
            vec![Box::new(GlobalMemorySelector::new())];
        let survivors = run_pipeline(all.clone(), &mut selectors);
        assert_eq!(survivors.len(), 2);
        assert!(survivors.iter().all(|d| d.global_memory() == 16 << 30));
        assert!(survivors.iter().all(|d| all.contains(d)));
    }

    #[test]
    fn test_pipeline_short_circuits_on_single_candidate() {
        struct CountingSelector {
            inits: std::rc::Rc<std::cell::Cell<usize>>,
        }

        impl DeviceSelector for CountingSelector {
            fn init(&mut self, _candidates: &[Device]) {
                self.inits.set(self.inits.get() + 1);
            }

            fn selected(&self, _device: &Device) -> bool {
                true
            }
        }

        let all = devices(vec![MockDevice::cpu("c"), MockDevice::gpu("g")]);
        let inits = std::rc::Rc::new(std::cell::Cell::new(0));

        // The type selector narrows to one device; the counting selector
        // after it must never run.
        let mut selectors: Vec<Box<dyn DeviceSelector>> = vec![
            Box::new(DeviceTypeSelector::gpu()),
            Box::new(CountingSelector {
                inits: inits.clone(),
            }),
        ];
        let survivors = run_pipeline(all, &mut selectors);
        assert_eq!(survivors.len(), 1);
        assert_eq!(inits.get(), 0);
    }

    #[test]
    fn test_pipeline_may_return_empty() {
        let all = devices(vec![MockDevice::cpu("c0"), MockDevice::cpu("c1")]);
        let mut selectors: Vec<Box<dyn DeviceSelector>> = vec![Box::new(DeviceTypeSelector::gpu())];
        assert!(run_pipeline(all, &mut selectors).is_empty());
    }

    #[test]
    fn test_pipeline_applies_selectors_in_order() {
        // Blacklist-then-fastest differs from fastest-then-blacklist: the
        // blacklisted device has the highest speed.
        let all = devices(vec![
            MockDevice::gpu("NVIDIA A").compute_units(50).clock_frequency_mhz(1),
            MockDevice::gpu("Intel(R) HD Graphics")
                .compute_units(80)
                .clock_frequency_mhz(1),
        ]);

        let mut selectors: Vec<Box<dyn DeviceSelector>> = vec![
            Box::new(BadDeviceSelector::NotIntegratedIntel),
            Box::new(FastestDeviceSelector::new()),
        ];
        let survivors = run_pipeline(all, &mut selectors);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].name(), "NVIDIA A");
    }
}
