// Sparenet Infra-System - platform probe adapters (power, activity, resources)

pub mod activity_probe_impl;
pub mod power_probe_impl;
pub mod resource_probe_impl;

pub use activity_probe_impl::ActivityProbeImpl;
pub use power_probe_impl::PowerProbeImpl;
pub use resource_probe_impl::ResourceProbeImpl;
