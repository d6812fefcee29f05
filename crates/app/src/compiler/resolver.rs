//! Action resolver: turns a declared action into a concrete call.

use relaylogic_domain::brightness::BrightnessSpec;
use relaylogic_domain::device::{Device, DeviceKind, DeviceRegistry};
use relaylogic_domain::error::ConfigError;
use relaylogic_domain::rpc::{BrightnessExpr, OnFlag, ResolvedCall, RpcMethod};
use relaylogic_domain::rule::Action;
use relaylogic_domain::settings::CompileSettings;

/// Resolves actions against the device registry and compile settings.
#[derive(Debug, Clone, Copy)]
pub struct ActionResolver<'a> {
    registry: &'a DeviceRegistry,
    settings: &'a CompileSettings,
}

impl<'a> ActionResolver<'a> {
    #[must_use]
    pub fn new(registry: &'a DeviceRegistry, settings: &'a CompileSettings) -> Self {
        Self { registry, settings }
    }

    /// Resolve one action, looking its target up in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDevice`] when the target is not
    /// registered, plus everything [`resolve_for`](Self::resolve_for) returns.
    pub fn resolve(&self, action: &Action) -> Result<ResolvedCall, ConfigError> {
        let target = self.registry.require(&action.device)?;
        self.resolve_for(action, target)
    }

    /// Resolve one action against an already looked-up target.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::BrightnessOutOfRange`] for literals outside 0..=100
    /// - [`ConfigError::RelayBrightness`] when a relay is given a level
    pub fn resolve_for(&self, action: &Action, target: &Device) -> Result<ResolvedCall, ConfigError> {
        let (on, brightness) = self.parameters(&action.brightness)?;
        let method = match target.kind {
            DeviceKind::Dimmer => RpcMethod::LightSet,
            DeviceKind::Relay if brightness.is_some() => {
                return Err(ConfigError::RelayBrightness {
                    device: target.name.clone(),
                });
            }
            DeviceKind::Relay => RpcMethod::SwitchSet,
        };
        Ok(ResolvedCall {
            device: target.name.clone(),
            address: target.address.clone(),
            method,
            output: Some(action.output),
            on,
            brightness,
        })
    }

    /// Resolve every action of a trigger case in declaration order.
    ///
    /// With `group_set_all` enabled, two actions covering both outputs of a
    /// dimmer at the same brightness collapse into one `Light.SetAll` call
    /// placed where the first of the pair was declared.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error.
    pub fn resolve_case(&self, actions: &[Action]) -> Result<Vec<ResolvedCall>, ConfigError> {
        let mut calls = Vec::with_capacity(actions.len());
        let mut consumed = vec![false; actions.len()];

        for (idx, action) in actions.iter().enumerate() {
            if consumed[idx] {
                continue;
            }
            let target = self.registry.require(&action.device)?;
            let mut call = self.resolve_for(action, target)?;

            let partner = if self.settings.group_set_all {
                set_all_partner(actions, idx, target)
            } else {
                None
            };
            if let Some(partner) = partner {
                consumed[partner] = true;
                call.method = RpcMethod::LightSetAll;
                call.output = None;
            }
            calls.push(call);
        }
        Ok(calls)
    }

    fn parameters(
        &self,
        spec: &BrightnessSpec,
    ) -> Result<(OnFlag, Option<BrightnessExpr>), ConfigError> {
        let resolved = match spec {
            BrightnessSpec::On => (OnFlag::Fixed(true), None),
            BrightnessSpec::Off => (OnFlag::Fixed(false), None),
            BrightnessSpec::Level(level) => {
                let level = u8::try_from(*level)
                    .ok()
                    .filter(|level| *level <= 100)
                    .ok_or(ConfigError::BrightnessOutOfRange { value: *level })?;
                (OnFlag::Fixed(true), Some(BrightnessExpr::Literal(level)))
            }
            BrightnessSpec::Preset(preset) => (
                OnFlag::Fixed(true),
                Some(BrightnessExpr::Literal(self.settings.presets.level(*preset))),
            ),
            BrightnessSpec::Adaptive => (OnFlag::Fixed(true), Some(BrightnessExpr::Adaptive)),
            BrightnessSpec::NightOnlyLow => (OnFlag::NightOnly, Some(BrightnessExpr::NightOnlyLow)),
        };
        Ok(resolved)
    }
}

/// Index of the action that pairs with `actions[idx]` into a `Light.SetAll`.
///
/// The target must be a dimmer with exactly two outputs, the case must touch
/// that dimmer exactly twice, once per output, with identical brightness.
fn set_all_partner(actions: &[Action], idx: usize, target: &Device) -> Option<usize> {
    if target.kind != DeviceKind::Dimmer || target.outputs.len() != 2 {
        return None;
    }
    let same_device: Vec<usize> = actions
        .iter()
        .enumerate()
        .filter(|(_, action)| action.device == target.name)
        .map(|(i, _)| i)
        .collect();
    let [first, second] = same_device.as_slice() else {
        return None;
    };
    if *first != idx {
        return None;
    }
    let (a, b) = (&actions[*first], &actions[*second]);
    let mut covered = [a.output, b.output];
    covered.sort_unstable();
    let mut outputs = target.output_indices();
    outputs.sort_unstable();

    (a.brightness == b.brightness && covered[..] == outputs[..]).then_some(*second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaylogic_domain::brightness::Preset;

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_devices(vec![
            Device::builder()
                .name("D1")
                .address("10.0.0.11")
                .kind(DeviceKind::Dimmer)
                .output(0, "Hall")
                .output(1, "Landing")
                .build()
                .unwrap(),
            Device::builder()
                .name("R1")
                .address("10.0.0.51")
                .kind(DeviceKind::Relay)
                .output(0, "Porch")
                .output(1, "Garden")
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    fn grouping() -> CompileSettings {
        CompileSettings {
            group_set_all: true,
            ..CompileSettings::default()
        }
    }

    #[test]
    fn should_emit_off_without_brightness() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        let call = resolver
            .resolve(&Action::new("D1", 0, BrightnessSpec::Off))
            .unwrap();
        assert_eq!(call.on, OnFlag::Fixed(false));
        assert_eq!(call.brightness, None);
        assert_eq!(call.method, RpcMethod::LightSet);
    }

    #[test]
    fn should_keep_literal_brightness() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        let call = resolver
            .resolve(&Action::new("D1", 1, BrightnessSpec::Level(35)))
            .unwrap();
        assert_eq!(call.on, OnFlag::Fixed(true));
        assert_eq!(call.brightness, Some(BrightnessExpr::Literal(35)));
        assert_eq!(call.output, Some(1));
        assert_eq!(call.address, "10.0.0.11");
    }

    #[test]
    fn should_fold_presets_from_settings() {
        let registry = registry();
        let mut settings = CompileSettings::default();
        settings.presets.max = 90;
        let resolver = ActionResolver::new(&registry, &settings);

        let call = resolver
            .resolve(&Action::new("D1", 0, BrightnessSpec::Preset(Preset::Max)))
            .unwrap();
        assert_eq!(call.brightness, Some(BrightnessExpr::Literal(90)));
    }

    #[test]
    fn should_defer_adaptive_and_night_only_low_to_runtime() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        let adaptive = resolver
            .resolve(&Action::new("D1", 0, BrightnessSpec::Adaptive))
            .unwrap();
        assert_eq!(adaptive.brightness, Some(BrightnessExpr::Adaptive));
        assert_eq!(adaptive.on, OnFlag::Fixed(true));

        let night = resolver
            .resolve(&Action::new("D1", 0, BrightnessSpec::NightOnlyLow))
            .unwrap();
        assert_eq!(night.on, OnFlag::NightOnly);
        assert_eq!(night.brightness, Some(BrightnessExpr::NightOnlyLow));
    }

    #[test]
    fn should_use_switch_set_for_relay_on_off() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        let call = resolver
            .resolve(&Action::new("R1", 1, BrightnessSpec::On))
            .unwrap();
        assert_eq!(call.method, RpcMethod::SwitchSet);
        assert_eq!(call.brightness, None);
    }

    #[test]
    fn should_reject_brightness_on_relay() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        for spec in [BrightnessSpec::Level(50), BrightnessSpec::Adaptive] {
            let err = resolver.resolve(&Action::new("R1", 0, spec)).unwrap_err();
            assert_eq!(
                err,
                ConfigError::RelayBrightness {
                    device: "R1".to_string()
                }
            );
        }
    }

    #[test]
    fn should_reject_out_of_range_brightness() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        for value in [101, -1] {
            let err = resolver
                .resolve(&Action::new("D1", 0, BrightnessSpec::Level(value)))
                .unwrap_err();
            assert_eq!(err, ConfigError::BrightnessOutOfRange { value });
        }
    }

    #[test]
    fn should_reject_unknown_device() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        let err = resolver
            .resolve(&Action::new("X9", 0, BrightnessSpec::On))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDevice { device } if device == "X9"));
    }

    #[test]
    fn should_group_both_dimmer_outputs_with_same_brightness() {
        let registry = registry();
        let settings = grouping();
        let resolver = ActionResolver::new(&registry, &settings);

        let calls = resolver
            .resolve_case(&[
                Action::new("D1", 0, BrightnessSpec::Level(60)),
                Action::new("D1", 1, BrightnessSpec::Level(60)),
            ])
            .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, RpcMethod::LightSetAll);
        assert_eq!(calls[0].output, None);
        assert_eq!(calls[0].brightness, Some(BrightnessExpr::Literal(60)));
    }

    #[test]
    fn should_not_group_when_brightness_differs() {
        let registry = registry();
        let settings = grouping();
        let resolver = ActionResolver::new(&registry, &settings);

        let calls = resolver
            .resolve_case(&[
                Action::new("D1", 1, BrightnessSpec::Level(60)),
                Action::new("D1", 0, BrightnessSpec::Level(30)),
            ])
            .unwrap();
        let outputs: Vec<_> = calls.iter().map(|c| c.output).collect();
        assert_eq!(outputs, vec![Some(1), Some(0)]);
        assert!(calls.iter().all(|c| c.method == RpcMethod::LightSet));
    }

    #[test]
    fn should_not_group_when_flag_is_off() {
        let registry = registry();
        let settings = CompileSettings::default();
        let resolver = ActionResolver::new(&registry, &settings);

        let calls = resolver
            .resolve_case(&[
                Action::new("D1", 0, BrightnessSpec::On),
                Action::new("D1", 1, BrightnessSpec::On),
            ])
            .unwrap();
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn should_not_group_relay_outputs() {
        let registry = registry();
        let settings = grouping();
        let resolver = ActionResolver::new(&registry, &settings);

        let calls = resolver
            .resolve_case(&[
                Action::new("R1", 0, BrightnessSpec::Off),
                Action::new("R1", 1, BrightnessSpec::Off),
            ])
            .unwrap();
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn should_place_grouped_call_at_first_declaration() {
        let registry = registry();
        let settings = grouping();
        let resolver = ActionResolver::new(&registry, &settings);

        let calls = resolver
            .resolve_case(&[
                Action::new("D1", 0, BrightnessSpec::Off),
                Action::new("R1", 0, BrightnessSpec::On),
                Action::new("D1", 1, BrightnessSpec::Off),
            ])
            .unwrap();
        let methods: Vec<_> = calls.iter().map(|c| c.method).collect();
        assert_eq!(methods, vec![RpcMethod::LightSetAll, RpcMethod::SwitchSet]);
    }
}
