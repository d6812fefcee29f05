//! Program emitter: merges every rule of one device into guarded blocks and
//! renders them on top of the runtime skeleton.
//!
//! Emission is split in two steps:
//! - [`ProgramEmitter::build`] produces the [`Program`] IR (guards, routed
//!   calls), which the host runtime can execute directly
//! - [`ProgramEmitter::render`] turns that IR into program text
//!
//! Rendering is a pure function of the IR and the settings, so the same facts
//! always produce byte-identical text.

use relaylogic_domain::device::Device;
use relaylogic_domain::error::ConfigError;
use relaylogic_domain::event::{TOGGLE_EVENT, component_id};
use relaylogic_domain::program::CompiledProgram;
use relaylogic_domain::rpc::{BrightnessExpr, OnFlag, ResolvedCall};
use relaylogic_domain::rule::{Ambient, MotionEdge, Rule};
use relaylogic_domain::settings::CompileSettings;

use super::program::{EventMatch, Guard, GuardedBlock, Program};
use super::resolver::ActionResolver;
use super::router::{CallRouter, RoutedCalls};
use super::template::{Template, quote};

const INDENT: &str = "    ";

/// Builds and renders the program of one device.
#[derive(Debug, Clone, Copy)]
pub struct ProgramEmitter<'a> {
    resolver: ActionResolver<'a>,
    settings: &'a CompileSettings,
    template: &'a Template,
}

impl<'a> ProgramEmitter<'a> {
    #[must_use]
    pub fn new(
        resolver: ActionResolver<'a>,
        settings: &'a CompileSettings,
        template: &'a Template,
    ) -> Self {
        Self {
            resolver,
            settings,
            template,
        }
    }

    /// Build the IR of `device` from the rules whose source it is.
    ///
    /// Blocks keep declaration order: rules first, then trigger cases within
    /// each rule.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MalformedPirTriggers`] when a motion-sensor input
    ///   declares anything besides one active and one inactive handler
    /// - [`ConfigError::OverlappingTrigger`] when `strict_triggers` is on and
    ///   two cases guard the same input and event with compatible daylight
    ///   conditions
    /// - any error of [`ActionResolver::resolve_case`]
    pub fn build<'r>(
        &self,
        device: &Device,
        rules: impl IntoIterator<Item = &'r Rule>,
    ) -> Result<Program, ConfigError> {
        let mut blocks: Vec<GuardedBlock> = Vec::new();

        for rule in rules {
            debug_assert_eq!(rule.device, device.name);
            let pir = device.is_pir_input(rule.input);
            for case in &rule.actions {
                let guard = Guard {
                    input: rule.input,
                    event: event_match(device, rule.input, pir, &case.trigger)?,
                    when: case.when,
                };
                if blocks.iter().any(|block| block.guard.overlaps(&guard)) {
                    if pir {
                        return Err(ConfigError::MalformedPirTriggers {
                            device: device.name.clone(),
                            input: rule.input,
                            reason: format!("duplicate `{}` handler", guard.event),
                        });
                    }
                    if self.settings.strict_triggers {
                        return Err(ConfigError::OverlappingTrigger {
                            device: device.name.clone(),
                            input: rule.input,
                            event: guard.to_string(),
                        });
                    }
                    if blocks.iter().any(|block| block.guard.shadows(&guard)) {
                        tracing::warn!(
                            device = %device.name,
                            input = rule.input,
                            trigger = %guard,
                            "trigger declared more than once, keeping the first"
                        );
                        continue;
                    }
                    tracing::warn!(
                        device = %device.name,
                        input = rule.input,
                        trigger = %guard,
                        "trigger partly covered by an earlier one"
                    );
                }

                let calls = self.resolver.resolve_case(&case.set)?;
                blocks.push(GuardedBlock {
                    guard,
                    body: CallRouter::route(calls, &device.name),
                });
            }
        }

        Ok(Program {
            owner: device.name.clone(),
            address: device.address.clone(),
            blocks,
        })
    }

    /// Render `program` as standalone program text.
    #[must_use]
    pub fn render(&self, program: &Program) -> String {
        let mut text = self.template.header(&program.owner, self.settings);
        text.push('\n');
        text.push_str(self.template.skeleton());
        text.push_str("\n//=========== rules ===========//\n\n");
        text.push_str("function onEvent(event) {\n");
        text.push_str(&format!("{INDENT}var info = event.info;\n"));
        text.push_str(&format!("{INDENT}if (!info) return;\n"));
        for block in &program.blocks {
            render_block(&mut text, block);
        }
        text.push_str("}\n\nstart(onEvent);\n");
        text
    }

    /// Build then render.
    ///
    /// # Errors
    ///
    /// Everything [`build`](Self::build) returns.
    pub fn emit<'r>(
        &self,
        device: &Device,
        rules: impl IntoIterator<Item = &'r Rule>,
    ) -> Result<CompiledProgram, ConfigError> {
        let program = self.build(device, rules)?;
        Ok(CompiledProgram {
            owner: program.owner.clone(),
            source: self.render(&program),
        })
    }
}

fn event_match(
    device: &Device,
    input: u8,
    pir: bool,
    trigger: &str,
) -> Result<EventMatch, ConfigError> {
    if !pir {
        return Ok(EventMatch::Named(trigger.to_string()));
    }
    MotionEdge::from_trigger(trigger)
        .map(EventMatch::Motion)
        .ok_or_else(|| ConfigError::MalformedPirTriggers {
            device: device.name.clone(),
            input,
            reason: format!("unexpected trigger `{trigger}`"),
        })
}

fn render_block(text: &mut String, block: &GuardedBlock) {
    let guard = &block.guard;
    let component = quote(&component_id(guard.input));
    let mut condition = match &guard.event {
        EventMatch::Named(name) => format!(
            "info.component === {component} && info.event === {}",
            quote(name)
        ),
        EventMatch::Motion(edge) => format!(
            "info.component === {component} && info.event === {} && info.state === {}",
            quote(TOGGLE_EVENT),
            edge.state()
        ),
    };
    match guard.when {
        Some(Ambient::Dark) => condition.push_str(" && isNight()"),
        Some(Ambient::Light) => condition.push_str(" && !isNight()"),
        None => {}
    }

    text.push_str(&format!("{INDENT}if ({condition}) {{\n"));
    match &guard.event {
        EventMatch::Named(_) => render_calls(text, &block.body, 2),
        EventMatch::Motion(edge) => {
            let pad = INDENT.repeat(2);
            text.push_str(&format!(
                "{pad}motion({}, {}, function () {{\n",
                guard.input,
                edge.state()
            ));
            render_calls(text, &block.body, 3);
            text.push_str(&format!("{pad}}});\n"));
        }
    }
    text.push_str(&format!("{}return;\n{INDENT}}}\n", INDENT.repeat(2)));
}

fn render_calls(text: &mut String, body: &RoutedCalls, depth: usize) {
    let pad = INDENT.repeat(depth);
    for call in &body.local {
        text.push_str(&format!(
            "{pad}callLocal({}, {});\n",
            quote(call.method.as_str()),
            params(call)
        ));
    }
    for batch in &body.remote {
        text.push_str(&format!("{pad}callRemote({}, [\n", quote(&batch.address)));
        let frames: Vec<String> = (1..)
            .zip(&batch.calls)
            .map(|(id, call): (u32, _)| {
                format!(
                    "{pad}{INDENT}{{ id: {id}, method: {}, params: {} }}",
                    quote(call.method.as_str()),
                    params(call)
                )
            })
            .collect();
        text.push_str(&frames.join(",\n"));
        text.push_str(&format!("\n{pad}]);\n"));
    }
}

/// Parameter object; clock-dependent values become runtime expressions.
fn params(call: &ResolvedCall) -> String {
    let mut fields = Vec::with_capacity(3);
    if let Some(id) = call.output {
        fields.push(format!("id: {id}"));
    }
    fields.push(match call.on {
        OnFlag::Fixed(on) => format!("on: {on}"),
        OnFlag::NightOnly => "on: isNight()".to_string(),
    });
    if let Some(brightness) = call.brightness {
        fields.push(match brightness {
            BrightnessExpr::Literal(level) => format!("brightness: {level}"),
            BrightnessExpr::Adaptive => "brightness: adaptive()".to_string(),
            BrightnessExpr::NightOnlyLow => "brightness: LOW".to_string(),
        });
    }
    format!("{{ {} }}", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaylogic_domain::brightness::BrightnessSpec;
    use relaylogic_domain::device::{DeviceKind, DeviceRegistry};
    use relaylogic_domain::rule::{Action, TriggerCase};

    fn registry() -> DeviceRegistry {
        DeviceRegistry::from_devices(vec![
            Device::builder()
                .name("D1")
                .address("10.0.0.11")
                .kind(DeviceKind::Dimmer)
                .input(0, "Hall switch")
                .input(1, "Hall PIR")
                .output(0, "Hall")
                .output(1, "Landing")
                .build()
                .unwrap(),
            Device::builder()
                .name("D2")
                .address("10.0.0.12")
                .kind(DeviceKind::Dimmer)
                .output(0, "Kitchen")
                .output(1, "Dining")
                .build()
                .unwrap(),
        ])
        .unwrap()
    }

    fn rule(input: u8, cases: Vec<TriggerCase>) -> Rule {
        Rule {
            device: "D1".to_string(),
            input,
            actions: cases,
        }
    }

    fn with_emitter<T>(settings: &CompileSettings, f: impl FnOnce(&ProgramEmitter<'_>, &Device) -> T) -> T {
        let registry = registry();
        let template = Template;
        let emitter = ProgramEmitter::new(ActionResolver::new(&registry, settings), settings, &template);
        let device = registry.get("D1").unwrap();
        f(&emitter, device)
    }

    #[test]
    fn should_route_one_local_and_batch_two_remote() {
        let rules = [rule(
            0,
            vec![TriggerCase::new(
                "single_push",
                vec![
                    Action::new("D1", 0, BrightnessSpec::Adaptive),
                    Action::new("D2", 0, BrightnessSpec::Off),
                    Action::new("D2", 1, BrightnessSpec::Level(30)),
                ],
            )],
        )];
        let settings = CompileSettings::default();
        let text = with_emitter(&settings, |emitter, device| {
            let program = emitter.build(device, &rules).unwrap();
            assert_eq!(program.blocks.len(), 1);
            assert_eq!(program.blocks[0].body.local.len(), 1);
            assert_eq!(program.blocks[0].body.remote.len(), 1);
            assert_eq!(program.blocks[0].body.remote[0].calls.len(), 2);
            emitter.render(&program)
        });

        assert!(text.contains(
            "if (info.component === \"input:0\" && info.event === \"single_push\") {"
        ));
        assert!(text.contains(
            "callLocal(\"Light.Set\", { id: 0, on: true, brightness: adaptive() });"
        ));
        assert!(text.contains("callRemote(\"10.0.0.12\", [\n"));
        assert!(text.contains(
            "{ id: 1, method: \"Light.Set\", params: { id: 0, on: false } },\n"
        ));
        assert!(text.contains(
            "{ id: 2, method: \"Light.Set\", params: { id: 1, on: true, brightness: 30 } }\n"
        ));
        assert!(text.ends_with("start(onEvent);\n"));
    }

    #[test]
    fn should_guard_pir_input_on_state_flag() {
        let rules = [rule(
            1,
            vec![
                TriggerCase::new("toggle_on", vec![Action::new("D1", 1, BrightnessSpec::NightOnlyLow)]),
                TriggerCase::new("motion-inactive", vec![Action::new("D1", 1, BrightnessSpec::Off)]),
            ],
        )];
        let settings = CompileSettings::default();
        let text = with_emitter(&settings, |emitter, device| {
            emitter.emit(device, &rules).unwrap().source
        });

        assert!(text.contains(
            "info.component === \"input:1\" && info.event === \"toggle\" && info.state === true"
        ));
        assert!(text.contains("motion(1, true, function () {"));
        assert!(text.contains("motion(1, false, function () {"));
        assert!(text.contains("callLocal(\"Light.Set\", { id: 1, on: isNight(), brightness: LOW });"));
        assert!(!text.contains("\"toggle_on\""));
    }

    #[test]
    fn should_reject_unexpected_trigger_when_input_is_pir() {
        let rules = [rule(1, vec![TriggerCase::new("single_push", vec![])])];
        let settings = CompileSettings::default();
        let err = with_emitter(&settings, |emitter, device| emitter.build(device, &rules)).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedPirTriggers { input: 1, .. }));
    }

    #[test]
    fn should_reject_duplicate_pir_handler_even_when_not_strict() {
        let rules = [
            rule(1, vec![TriggerCase::new("motion-active", vec![])]),
            rule(1, vec![TriggerCase::new("toggle_on", vec![])]),
        ];
        let settings = CompileSettings {
            strict_triggers: false,
            ..CompileSettings::default()
        };
        let err = with_emitter(&settings, |emitter, device| emitter.build(device, &rules)).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedPirTriggers { .. }));
    }

    #[test]
    fn should_reject_overlapping_trigger_when_strict() {
        let rules = [
            rule(0, vec![TriggerCase::new("single_push", vec![])]),
            rule(0, vec![TriggerCase::new("single_push", vec![])]),
        ];
        let settings = CompileSettings::default();
        let err = with_emitter(&settings, |emitter, device| emitter.build(device, &rules)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OverlappingTrigger {
                device: "D1".to_string(),
                input: 0,
                event: "single_push".to_string(),
            }
        );
    }

    #[test]
    fn should_keep_first_block_when_not_strict() {
        let rules = [
            rule(0, vec![TriggerCase::new("single_push", vec![Action::new("D1", 0, BrightnessSpec::On)])]),
            rule(0, vec![TriggerCase::new("single_push", vec![Action::new("D1", 0, BrightnessSpec::Off)])]),
        ];
        let settings = CompileSettings {
            strict_triggers: false,
            ..CompileSettings::default()
        };
        let program = with_emitter(&settings, |emitter, device| emitter.build(device, &rules)).unwrap();
        assert_eq!(program.blocks.len(), 1);
        assert_eq!(program.blocks[0].body.local[0].on, OnFlag::Fixed(true));
    }

    #[test]
    fn should_end_every_block_with_return() {
        let rules = [rule(
            0,
            vec![
                TriggerCase::new("single_push", vec![Action::new("D1", 0, BrightnessSpec::On)]),
                TriggerCase::new("long_push", vec![Action::new("D1", 0, BrightnessSpec::Off)]),
            ],
        )];
        let settings = CompileSettings::default();
        let text = with_emitter(&settings, |emitter, device| {
            emitter.emit(device, &rules).unwrap().source
        });
        assert_eq!(text.matches("        return;\n    }\n").count(), 2);
    }

    #[test]
    fn should_propagate_unknown_target_device() {
        let rules = [rule(
            0,
            vec![TriggerCase::new("single_push", vec![Action::new("D9", 0, BrightnessSpec::On)])],
        )];
        let settings = CompileSettings::default();
        let err = with_emitter(&settings, |emitter, device| emitter.build(device, &rules)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownDevice {
                device: "D9".to_string()
            }
        );
    }

    #[test]
    fn should_gate_block_on_daylight_condition() {
        let rules = [rule(
            0,
            vec![
                TriggerCase::new("single_push", vec![Action::new("D1", 0, BrightnessSpec::Level(10))])
                    .when(Ambient::Dark),
                TriggerCase::new("single_push", vec![Action::new("D1", 0, BrightnessSpec::Level(90))])
                    .when(Ambient::Light),
            ],
        )];
        let settings = CompileSettings::default();
        let (program, text) = with_emitter(&settings, |emitter, device| {
            let program = emitter.build(device, &rules).unwrap();
            let text = emitter.render(&program);
            (program, text)
        });

        assert_eq!(program.blocks.len(), 2);
        assert_eq!(program.blocks[0].guard.when, Some(Ambient::Dark));
        assert!(text.contains(
            "if (info.component === \"input:0\" && info.event === \"single_push\" && isNight()) {"
        ));
        assert!(text.contains(
            "if (info.component === \"input:0\" && info.event === \"single_push\" && !isNight()) {"
        ));
    }

    #[test]
    fn should_gate_motion_block_on_daylight_condition() {
        let rules = [rule(
            1,
            vec![
                TriggerCase::new("motion-active", vec![Action::new("D1", 1, BrightnessSpec::On)])
                    .when(Ambient::Dark),
                TriggerCase::new("motion-inactive", vec![Action::new("D1", 1, BrightnessSpec::Off)]),
            ],
        )];
        let settings = CompileSettings::default();
        let text = with_emitter(&settings, |emitter, device| {
            emitter.emit(device, &rules).unwrap().source
        });
        assert!(text.contains("&& info.state === true && isNight()) {"));
        assert!(text.contains("&& info.state === false) {"));
    }

    #[test]
    fn should_reject_conditional_case_after_unconditional_when_strict() {
        let rules = [rule(
            0,
            vec![
                TriggerCase::new("single_push", vec![]),
                TriggerCase::new("single_push", vec![]).when(Ambient::Dark),
            ],
        )];
        let settings = CompileSettings::default();
        let err = with_emitter(&settings, |emitter, device| emitter.build(device, &rules)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OverlappingTrigger {
                device: "D1".to_string(),
                input: 0,
                event: "single_push when dark".to_string(),
            }
        );
    }

    #[test]
    fn should_keep_partly_covered_case_when_not_strict() {
        let settings = CompileSettings {
            strict_triggers: false,
            ..CompileSettings::default()
        };
        let shadowed = [rule(
            0,
            vec![
                TriggerCase::new("single_push", vec![]),
                TriggerCase::new("single_push", vec![]).when(Ambient::Dark),
            ],
        )];
        let program = with_emitter(&settings, |emitter, device| emitter.build(device, &shadowed)).unwrap();
        assert_eq!(program.blocks.len(), 1);

        let fallback = [rule(
            0,
            vec![
                TriggerCase::new("single_push", vec![]).when(Ambient::Dark),
                TriggerCase::new("single_push", vec![]),
                TriggerCase::new("single_push", vec![]),
            ],
        )];
        let program = with_emitter(&settings, |emitter, device| emitter.build(device, &fallback)).unwrap();
        assert_eq!(program.blocks.len(), 2);
        assert_eq!(program.blocks[1].guard.when, None);
    }
}
