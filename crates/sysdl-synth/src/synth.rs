//! The value synthesizer.
//!
//! A [`Session`] walks one operation (or an ordered sequence) and produces
//! one concrete value per parameter satisfying every static constraint in
//! the model. The model is shared read-only; the session owns all mutable
//! state (RNG, handle bindings), so any number of sessions run in parallel
//! over one model.

use std::collections::HashMap;

use tracing::debug;

use sysdl_core::{
    Domain, Operation, OperationKey, ScalarType, Signedness, SizePolicy, StringKind,
    TypeDescriptor,
};
use sysdl_load::Model;

use crate::error::{ConstraintViolation, SynthesisError};
use crate::policy::{Policy, ScalarStrategy};
use crate::rng::Rng;
use crate::value::{ArgValue, ArgumentAssignment, HandleOrigin, NamedArg};

/// Default cap on lengths chosen for length-linked buffers when the
/// caller pins nothing (the auxiliary length policy).
const AUX_LENGTH_MAX: u64 = 256;

/// One synthesis session over a shared model.
///
/// Sequential and single-threaded by construction: no I/O, no blocking,
/// no suspension points. A discarded session requires no cleanup.
pub struct Session<'m> {
    model: &'m Model,
    policy: Policy,
    rng: Rng,
    /// Kind -> session call index of the latest producing call.
    bindings: HashMap<String, usize>,
    calls: usize,
}

impl<'m> Session<'m> {
    /// Start a session. Touches OS entropy only when the policy carries
    /// no seed.
    pub fn new(model: &'m Model, policy: Policy) -> Result<Self, SynthesisError> {
        let rng = match policy.seed {
            Some(seed) => Rng::seeded(seed),
            None => Rng::from_entropy()?,
        };
        Ok(Self {
            model,
            policy,
            rng,
            bindings: HashMap::new(),
            calls: 0,
        })
    }

    /// Synthesize one operation.
    pub fn synthesize(
        &mut self,
        key: &OperationKey,
    ) -> Result<ArgumentAssignment, SynthesisError> {
        let op = self
            .model
            .table()
            .get(key)
            .ok_or_else(|| SynthesisError::UnknownOperation { key: key.clone() })?;

        let mut slots: Vec<Option<ArgValue>> = vec![None; op.params.len()];
        for idx in 0..op.params.len() {
            if slots[idx].is_none() {
                self.synth_param(op, idx, &mut slots)?;
            }
        }

        let args = op
            .params
            .iter()
            .zip(slots)
            .map(|(param, slot)| NamedArg {
                name: param.name.clone(),
                value: slot.expect("every parameter slot is filled after the walk"),
            })
            .collect();

        let assignment = ArgumentAssignment {
            op: key.clone(),
            call: self.calls,
            args,
            produces: op.produced_kind().map(String::from),
        };
        if let Some(kind) = &assignment.produces {
            self.bindings.insert(kind.clone(), self.calls);
            debug!(kind = %kind, call = self.calls, "handle produced");
        }
        self.calls += 1;
        Ok(assignment)
    }

    /// Synthesize an ordered sequence; handles produced by earlier calls
    /// feed later consumers.
    pub fn synthesize_sequence(
        &mut self,
        keys: &[OperationKey],
    ) -> Result<Vec<ArgumentAssignment>, SynthesisError> {
        keys.iter().map(|key| self.synthesize(key)).collect()
    }

    /// Synthesize with exactly one deliberately violated constraint on the
    /// named parameter, reporting which constraint was violated. Fails if
    /// the parameter carries no violable constraint.
    pub fn synthesize_invalid(
        &mut self,
        key: &OperationKey,
        param: &str,
    ) -> Result<(ArgumentAssignment, ConstraintViolation), SynthesisError> {
        let op = self
            .model
            .table()
            .get(key)
            .ok_or_else(|| SynthesisError::UnknownOperation { key: key.clone() })?;
        if op.param(param).is_none() {
            return Err(SynthesisError::UnknownParameter {
                key: key.clone(),
                param: param.to_string(),
            });
        }
        let plan = violation_plan(op, param).ok_or_else(|| SynthesisError::NothingToViolate {
            key: key.clone(),
            param: param.to_string(),
        })?;

        let mut assignment = self.synthesize(key)?;
        let violation = self.apply_violation(&mut assignment, plan)?;
        Ok((assignment, violation))
    }

    // --- parameter synthesis ---

    fn synth_param(
        &mut self,
        op: &Operation,
        idx: usize,
        slots: &mut Vec<Option<ArgValue>>,
    ) -> Result<(), SynthesisError> {
        let param = &op.params[idx];

        // A length-link target is never chosen independently; synthesizing
        // its buffer fills this slot, whichever side comes first in
        // declaration order.
        if param.ty.is_integer_scalar() {
            if let Some(buffer) = op.buffer_linked_to(&param.name) {
                if self.policy.pins.contains_key(&param.name) {
                    return Err(SynthesisError::PinnedLengthLink {
                        param: param.name.clone(),
                    });
                }
                let buffer_idx = op
                    .param_index(buffer)
                    .expect("link target resolved during validation");
                if slots[buffer_idx].is_none() {
                    self.synth_param(op, buffer_idx, slots)?;
                }
                return Ok(());
            }
        }

        if let Some(&pin) = self.policy.pins.get(&param.name) {
            slots[idx] = Some(ArgValue::Int(self.check_pin(param.name.as_str(), &param.ty, pin)?));
            return Ok(());
        }

        let mut link: Option<(String, u64)> = None;
        let value = self.synth_type(&param.name, &param.ty, &mut link)?;
        slots[idx] = Some(value);

        if let Some((len_param, length)) = link {
            let len_idx = op
                .param_index(&len_param)
                .expect("link target resolved during validation");
            debug!(buffer = %param.name, len_param = %len_param, length, "length-link bound");
            slots[len_idx] = Some(ArgValue::Int(length as i128));
        }
        Ok(())
    }

    fn check_pin(
        &self,
        param: &str,
        ty: &TypeDescriptor,
        pin: i128,
    ) -> Result<i128, SynthesisError> {
        let admissible = match ty {
            TypeDescriptor::Scalar(scalar) => scalar.fits(pin),
            TypeDescriptor::ConstantDomain { base, domain } => {
                base.fits(pin) && domain.contains(pin)
            }
            _ => false,
        };
        if admissible {
            Ok(pin)
        } else {
            Err(SynthesisError::PinOutOfDomain {
                param: param.to_string(),
                value: pin,
            })
        }
    }

    fn synth_type(
        &mut self,
        param: &str,
        ty: &TypeDescriptor,
        link: &mut Option<(String, u64)>,
    ) -> Result<ArgValue, SynthesisError> {
        match ty {
            TypeDescriptor::Scalar(scalar) => Ok(ArgValue::Int(self.scalar_value(*scalar))),
            TypeDescriptor::ConstantDomain { domain, .. } => {
                Ok(ArgValue::Int(self.domain_value(domain)))
            }
            TypeDescriptor::Pointer { direction, pointee } => Ok(ArgValue::Pointer {
                direction: *direction,
                pointee: Box::new(self.synth_type(param, pointee, link)?),
            }),
            TypeDescriptor::Buffer { element, size } => {
                let count = self.buffer_count(param, size, link)?;
                self.synth_elements(param, element, count)
            }
            TypeDescriptor::StringLit { kind, alternatives } => {
                Ok(ArgValue::Str(if alternatives.is_empty() {
                    self.gen_string(*kind)
                } else {
                    self.rng.pick(alternatives).clone()
                }))
            }
            TypeDescriptor::ResourceHandle { kind } => {
                if let Some(&call) = self.bindings.get(kind) {
                    debug!(kind = %kind, call, "handle reused");
                    Ok(ArgValue::Handle {
                        kind: kind.clone(),
                        origin: HandleOrigin::Result { call },
                    })
                } else if let Some(value) = self.model.registry().stand_in(kind) {
                    Ok(ArgValue::Handle {
                        kind: kind.clone(),
                        origin: HandleOrigin::StandIn { value },
                    })
                } else {
                    Err(SynthesisError::UnsatisfiableResource {
                        kind: kind.clone(),
                        param: param.to_string(),
                    })
                }
            }
            TypeDescriptor::OpaqueStruct { name, size } => Ok(ArgValue::Struct {
                name: name.clone(),
                bytes: vec![0; *size as usize],
            }),
        }
    }

    fn buffer_count(
        &mut self,
        param: &str,
        size: &SizePolicy,
        link: &mut Option<(String, u64)>,
    ) -> Result<u64, SynthesisError> {
        let pin = self.policy.len_pins.get(param).copied();
        match size {
            SizePolicy::Fixed(n) => match pin {
                Some(count) if count != *n => Err(SynthesisError::PinOutOfRange {
                    param: param.to_string(),
                    count,
                    detail: format!("buffer is fixed at {n} elements"),
                }),
                _ => Ok(*n),
            },
            SizePolicy::Range { min, max } => match pin {
                Some(count) if count < *min || count > *max => {
                    Err(SynthesisError::PinOutOfRange {
                        param: param.to_string(),
                        count,
                        detail: format!("admissible range is ({min},{max})"),
                    })
                }
                Some(count) => Ok(count),
                None => Ok(self.count_in_range(*min, *max)),
            },
            SizePolicy::LinkedToLength {
                param: len_param,
                width,
            } => {
                let width_max = width.max_value().min(u64::MAX as i128) as u64;
                let count = match pin {
                    Some(count) if (count as i128) > width.max_value() => {
                        return Err(SynthesisError::PinOutOfRange {
                            param: param.to_string(),
                            count,
                            detail: format!("length does not fit link width {width}"),
                        })
                    }
                    Some(count) => count,
                    None => self.count_in_range(0, AUX_LENGTH_MAX.min(width_max)),
                };
                *link = Some((len_param.clone(), count));
                Ok(count)
            }
        }
    }

    fn synth_elements(
        &mut self,
        param: &str,
        element: &TypeDescriptor,
        count: u64,
    ) -> Result<ArgValue, SynthesisError> {
        // 8-bit element buffers become raw byte runs.
        if let TypeDescriptor::Scalar(scalar) = element {
            if scalar.width == 8 {
                let mut bytes = vec![0u8; count as usize];
                for b in bytes.iter_mut() {
                    *b = self.rng.next_u64() as u8;
                }
                return Ok(ArgValue::Bytes(bytes));
            }
        }
        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            // Nested length-links cannot occur; links attach only at the
            // parameter level.
            let mut no_link = None;
            items.push(self.synth_type(param, element, &mut no_link)?);
        }
        Ok(ArgValue::Array(items))
    }

    // --- scalar choice ---

    fn scalar_value(&mut self, scalar: ScalarType) -> i128 {
        if self.policy.strategy == ScalarStrategy::BoundaryBiased && self.rng.one_in(2) {
            let candidates = [scalar.min_value(), scalar.max_value(), 0, 1];
            return *self.rng.pick(&candidates);
        }
        let mask = if scalar.width == 64 {
            u64::MAX
        } else {
            (1u64 << scalar.width) - 1
        };
        let raw = self.rng.next_u64() & mask;
        match scalar.signedness {
            Signedness::Unsigned => raw as i128,
            Signedness::Signed => {
                let half = 1u64 << (scalar.width - 1);
                if raw >= half {
                    raw as i128 - (1i128 << scalar.width)
                } else {
                    raw as i128
                }
            }
        }
    }

    fn domain_value(&mut self, domain: &Domain) -> i128 {
        match domain {
            Domain::Set(values) => *self.rng.pick(values),
            Domain::Range { lo, hi } => {
                if self.policy.strategy == ScalarStrategy::BoundaryBiased && self.rng.one_in(2) {
                    return *self.rng.pick(&[*lo, *hi]);
                }
                let span = (*hi - *lo) as u128 + 1;
                if span > u64::MAX as u128 {
                    *lo + self.rng.next_u64() as i128
                } else {
                    *lo + self.rng.below(span as u64) as i128
                }
            }
        }
    }

    fn count_in_range(&mut self, min: u64, max: u64) -> u64 {
        if self.policy.strategy == ScalarStrategy::BoundaryBiased && self.rng.one_in(2) {
            return *self.rng.pick(&[min, max]);
        }
        self.rng.range_u64(min, max)
    }

    fn gen_string(&mut self, kind: StringKind) -> String {
        const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let len = self.rng.range_u64(1, 8) as usize;
        let body: String = (0..len)
            .map(|_| CHARSET[self.rng.below(CHARSET.len() as u64) as usize] as char)
            .collect();
        match kind {
            StringKind::Str => body,
            StringKind::Path => format!("./{body}"),
        }
    }

    // --- invalid mode ---

    fn apply_violation(
        &mut self,
        assignment: &mut ArgumentAssignment,
        plan: ViolationPlan,
    ) -> Result<ConstraintViolation, SynthesisError> {
        match plan {
            ViolationPlan::OutOfDomain { param, value } => {
                let slot = slot_mut(assignment, &param);
                let old = terminal_mut(slot).clone();
                *terminal_mut(slot) = ArgValue::Int(value);
                Ok(ConstraintViolation {
                    parameter: param,
                    constraint: "constant-domain".into(),
                    detail: format!("replaced {old} with out-of-domain value {value}"),
                })
            }
            ViolationPlan::OutOfStringDomain { param, value } => {
                let slot = slot_mut(assignment, &param);
                *terminal_mut(slot) = ArgValue::Str(value.clone());
                Ok(ConstraintViolation {
                    parameter: param,
                    constraint: "string-domain".into(),
                    detail: format!("chose {value:?}, which is not a declared alternative"),
                })
            }
            ViolationPlan::WrongCount {
                param,
                constraint,
                target,
            } => {
                let op_key = assignment.op.clone();
                let slot = slot_mut(assignment, &param);
                let node = buffer_node_mut(slot).ok_or(SynthesisError::NothingToViolate {
                    key: op_key,
                    param: param.clone(),
                })?;
                let before = node.buffer_len().unwrap_or(0);
                let target = target as usize;
                match node {
                    ArgValue::Bytes(bytes) => {
                        while bytes.len() > target {
                            bytes.pop();
                        }
                        while bytes.len() < target {
                            bytes.push(self.rng.next_u64() as u8);
                        }
                    }
                    ArgValue::Array(items) => {
                        while items.len() > target {
                            items.pop();
                        }
                        while items.len() < target {
                            let extra = items.last().cloned().unwrap_or(ArgValue::Int(0));
                            items.push(extra);
                        }
                    }
                    _ => unreachable!("buffer_node_mut returns buffers only"),
                }
                Ok(ConstraintViolation {
                    parameter: param,
                    constraint,
                    detail: format!("element count changed from {before} to {target}"),
                })
            }
            ViolationPlan::BrokenLink { len_param } => {
                let slot = slot_mut(assignment, &len_param);
                let old = slot.as_int().unwrap_or(0);
                let new = if old > 0 { old - 1 } else { old + 1 };
                *slot = ArgValue::Int(new);
                Ok(ConstraintViolation {
                    parameter: len_param,
                    constraint: "length-link".into(),
                    detail: format!("length value changed from {old} to {new}"),
                })
            }
        }
    }
}

enum ViolationPlan {
    OutOfDomain { param: String, value: i128 },
    OutOfStringDomain { param: String, value: String },
    WrongCount {
        param: String,
        constraint: String,
        /// Element count guaranteed to sit outside the size policy.
        target: u64,
    },
    BrokenLink { len_param: String },
}

/// Decide how the named parameter's constraint can be violated, if at all.
fn violation_plan(op: &Operation, param: &str) -> Option<ViolationPlan> {
    // The named parameter is a length-link target: desynchronize it.
    if op.buffer_linked_to(param).is_some() {
        return Some(ViolationPlan::BrokenLink {
            len_param: param.to_string(),
        });
    }

    let descriptor = &op.param(param)?.ty;
    if let TypeDescriptor::ConstantDomain { base, domain } = strip_pointers(descriptor) {
        let value = out_of_domain_value(*base, domain)?;
        return Some(ViolationPlan::OutOfDomain {
            param: param.to_string(),
            value,
        });
    }
    if let TypeDescriptor::StringLit { alternatives, .. } = strip_pointers(descriptor) {
        if !alternatives.is_empty() {
            let mut value = String::from("!invalid");
            while alternatives.contains(&value) {
                value.push('!');
            }
            return Some(ViolationPlan::OutOfStringDomain {
                param: param.to_string(),
                value,
            });
        }
        return None;
    }
    if let Some((_, size)) = descriptor.buffer_view() {
        return match size {
            SizePolicy::Fixed(n) => Some(ViolationPlan::WrongCount {
                param: param.to_string(),
                constraint: "fixed-size".into(),
                target: n + 1,
            }),
            SizePolicy::Range { min, max } => {
                if *min > 0 {
                    Some(ViolationPlan::WrongCount {
                        param: param.to_string(),
                        constraint: "size-range".into(),
                        target: min - 1,
                    })
                } else if *max < u64::MAX {
                    Some(ViolationPlan::WrongCount {
                        param: param.to_string(),
                        constraint: "size-range".into(),
                        target: max + 1,
                    })
                } else {
                    None
                }
            }
            SizePolicy::LinkedToLength {
                param: len_param, ..
            } => Some(ViolationPlan::BrokenLink {
                len_param: len_param.clone(),
            }),
        };
    }
    None
}

fn strip_pointers(ty: &TypeDescriptor) -> &TypeDescriptor {
    match ty {
        TypeDescriptor::Pointer { pointee, .. } => strip_pointers(pointee),
        other => other,
    }
}

/// A value just outside the domain but inside the base width.
fn out_of_domain_value(base: ScalarType, domain: &Domain) -> Option<i128> {
    let candidates = match domain {
        Domain::Set(values) => {
            let max = *values.iter().max()?;
            let min = *values.iter().min()?;
            vec![max + 1, min - 1, 0, 1, base.min_value(), base.max_value()]
        }
        Domain::Range { lo, hi } => {
            vec![*hi + 1, *lo - 1, base.min_value(), base.max_value()]
        }
    };
    candidates
        .into_iter()
        .find(|v| base.fits(*v) && !domain.contains(*v))
}

fn slot_mut<'a>(assignment: &'a mut ArgumentAssignment, param: &str) -> &'a mut ArgValue {
    assignment
        .args
        .iter_mut()
        .find(|a| a.name == param)
        .map(|a| &mut a.value)
        .expect("violation targets an existing parameter")
}

fn terminal_mut(value: &mut ArgValue) -> &mut ArgValue {
    match value {
        ArgValue::Pointer { pointee, .. } => terminal_mut(pointee),
        other => other,
    }
}

fn buffer_node_mut(value: &mut ArgValue) -> Option<&mut ArgValue> {
    match value {
        ArgValue::Pointer { pointee, .. } => buffer_node_mut(pointee),
        node @ (ArgValue::Bytes(_) | ArgValue::Array(_)) => Some(node),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysdl_core::TypeRegistry;
    use sysdl_load::load;

    const CATALOGUE: &str = r#"
        group Kvm {
            fn openkvm(file *In filename{"/dev/kvm"}) kvmfd_t
            fn ioctl@KVM_CREATE_VM(fd kvmfd_t, cmd i32{0xae01}) kvmvmfd_t
            fn ioctl@KVM_CREATE_VCPU(fd kvmvmfd_t, cmd i32{0xae41}, arg i32{0,1,2,3}) vcpu_t
        }
        group Files {
            fn write(fd fd_t, buf *[i8], count len<i32, buf>)
            fn fstat(fd fd_t, statbuf *Out stat)
            fn chunk(data [u8; (1, 8)])
            fn fixed4(quad [u32; 4])
            fn pickone(n u8{(1, 8)}, tag *In cstr{"alpha", "beta"})
        }
    "#;

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.register_resource("fd_t", Some(0));
        reg.register_resource("kvmfd_t", None);
        reg.register_resource("kvmvmfd_t", None);
        reg.register_resource("vcpu_t", None);
        reg.register_struct("stat", 144);
        reg
    }

    fn model() -> Model {
        load(CATALOGUE, &registry()).expect("fixture catalogue loads")
    }

    fn key(text: &str) -> OperationKey {
        OperationKey::parse(text)
    }

    #[test]
    fn domain_values_always_legal() {
        let model = model();

        // No producer yet for kvmvmfd_t: must fail, never guess.
        let mut session = Session::new(&model, Policy::uniform().with_seed(11)).unwrap();
        let err = session.synthesize(&key("ioctl@KVM_CREATE_VCPU"));
        assert!(matches!(
            err,
            Err(SynthesisError::UnsatisfiableResource { ref kind, ref param })
                if kind == "kvmvmfd_t" && param == "fd"
        ));

        let mut session = Session::new(&model, Policy::uniform().with_seed(11)).unwrap();
        let calls = session
            .synthesize_sequence(&[
                key("openkvm"),
                key("ioctl@KVM_CREATE_VM"),
                key("ioctl@KVM_CREATE_VCPU"),
            ])
            .unwrap();
        let vcpu = &calls[2];
        assert_eq!(vcpu.arg("cmd").unwrap().as_int(), Some(0xae41));
        for _ in 0..100 {
            let again = session
                .synthesize(&key("ioctl@KVM_CREATE_VCPU"))
                .unwrap();
            assert_eq!(again.arg("cmd").unwrap().as_int(), Some(0xae41));
            let arg = again.arg("arg").unwrap().as_int().unwrap();
            assert!((0..=3).contains(&arg), "arg {arg} outside domain");
        }
    }

    #[test]
    fn write_with_pinned_17_byte_buffer_sets_count_17() {
        let model = model();
        let mut session =
            Session::new(&model, Policy::uniform().with_seed(1).pin_len("buf", 17)).unwrap();
        let call = session.synthesize(&key("write")).unwrap();
        assert_eq!(call.arg("buf").unwrap().buffer_len(), Some(17));
        assert_eq!(call.arg("count").unwrap().as_int(), Some(17));
    }

    #[test]
    fn length_link_always_equals_buffer_length() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(5)).unwrap();
        for _ in 0..50 {
            let call = session.synthesize(&key("write")).unwrap();
            let len = call.arg("buf").unwrap().buffer_len().unwrap();
            assert_eq!(call.arg("count").unwrap().as_int(), Some(len as i128));
        }
    }

    #[test]
    fn sequence_binds_consumer_to_producer_result() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(3)).unwrap();
        let calls = session
            .synthesize_sequence(&[key("openkvm"), key("ioctl@KVM_CREATE_VM")])
            .unwrap();
        assert_eq!(calls[0].produces.as_deref(), Some("kvmfd_t"));
        assert_eq!(
            calls[1].arg("fd").unwrap(),
            &ArgValue::Handle {
                kind: "kvmfd_t".into(),
                origin: HandleOrigin::Result { call: 0 },
            }
        );
    }

    #[test]
    fn stand_in_used_when_no_producer_ran() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(4)).unwrap();
        let call = session.synthesize(&key("write")).unwrap();
        assert_eq!(
            call.arg("fd").unwrap(),
            &ArgValue::Handle {
                kind: "fd_t".into(),
                origin: HandleOrigin::StandIn { value: 0 },
            }
        );
    }

    #[test]
    fn consumer_alone_without_stand_in_fails_naming_kind_and_param() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(9)).unwrap();
        let err = session
            .synthesize(&key("ioctl@KVM_CREATE_VM"))
            .unwrap_err();
        match err {
            SynthesisError::UnsatisfiableResource { kind, param } => {
                assert_eq!(kind, "kvmfd_t");
                assert_eq!(param, "fd");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn uniform_range_hits_both_ends() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(21)).unwrap();
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..300 {
            let call = session.synthesize(&key("chunk")).unwrap();
            match call.arg("data").unwrap().buffer_len().unwrap() {
                1 => seen_min = true,
                8 => seen_max = true,
                n => assert!((1..=8).contains(&n)),
            }
        }
        assert!(seen_min, "min never produced");
        assert!(seen_max, "max never produced");
    }

    #[test]
    fn fixed_buffer_has_exactly_n_elements() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(2)).unwrap();
        let call = session.synthesize(&key("fixed4")).unwrap();
        assert_eq!(call.arg("quad").unwrap().buffer_len(), Some(4));
    }

    #[test]
    fn string_alternatives_and_struct_blocks() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(6)).unwrap();
        let call = session.synthesize(&key("pickone")).unwrap();
        match call.arg("tag").unwrap() {
            ArgValue::Pointer { pointee, .. } => match pointee.as_ref() {
                ArgValue::Str(s) => assert!(s == "alpha" || s == "beta"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }

        let call = session.synthesize(&key("fstat")).unwrap();
        match call.arg("statbuf").unwrap() {
            ArgValue::Pointer { pointee, .. } => match pointee.as_ref() {
                ArgValue::Struct { name, bytes } => {
                    assert_eq!(name, "stat");
                    assert_eq!(bytes.len(), 144);
                    assert!(bytes.iter().all(|b| *b == 0));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn seeded_sessions_replay_identically() {
        let model = model();
        let keys = [key("openkvm"), key("ioctl@KVM_CREATE_VM"), key("write")];
        let mut a = Session::new(&model, Policy::uniform().with_seed(77)).unwrap();
        let mut b = Session::new(&model, Policy::uniform().with_seed(77)).unwrap();
        assert_eq!(
            a.synthesize_sequence(&keys).unwrap(),
            b.synthesize_sequence(&keys).unwrap()
        );
    }

    #[test]
    fn pinned_scalar_outside_domain_is_refused() {
        let model = model();
        let mut session =
            Session::new(&model, Policy::uniform().with_seed(1).pin("n", 9)).unwrap();
        let err = session.synthesize(&key("pickone")).unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::PinOutOfDomain { ref param, value: 9 } if param == "n"
        ));
    }

    #[test]
    fn pinning_a_length_link_target_is_refused() {
        let model = model();
        let mut session =
            Session::new(&model, Policy::uniform().with_seed(1).pin("count", 5)).unwrap();
        let err = session.synthesize(&key("write")).unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::PinnedLengthLink { ref param } if param == "count"
        ));
    }

    #[test]
    fn invalid_mode_reports_the_violated_constraint() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(13)).unwrap();
        let (call, violation) = session
            .synthesize_invalid(&key("write"), "count")
            .unwrap();
        assert_eq!(violation.parameter, "count");
        assert_eq!(violation.constraint, "length-link");
        let len = call.arg("buf").unwrap().buffer_len().unwrap() as i128;
        assert_ne!(call.arg("count").unwrap().as_int(), Some(len));
    }

    #[test]
    fn invalid_mode_domain_violation() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(13)).unwrap();
        session.synthesize(&key("openkvm")).unwrap();
        session.synthesize(&key("ioctl@KVM_CREATE_VM")).unwrap();
        let (call, violation) = session
            .synthesize_invalid(&key("ioctl@KVM_CREATE_VCPU"), "arg")
            .unwrap();
        assert_eq!(violation.constraint, "constant-domain");
        let arg = call.arg("arg").unwrap().as_int().unwrap();
        assert!(!(0..=3).contains(&arg), "value {arg} still in domain");
    }

    #[test]
    fn invalid_mode_fixed_size_violation() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(8)).unwrap();
        let (call, violation) = session.synthesize_invalid(&key("fixed4"), "quad").unwrap();
        assert_eq!(violation.constraint, "fixed-size");
        assert_eq!(call.arg("quad").unwrap().buffer_len(), Some(5));
    }

    #[test]
    fn invalid_mode_refuses_unconstrained_parameters() {
        let model = model();
        let mut session = Session::new(&model, Policy::uniform().with_seed(8)).unwrap();
        let err = session.synthesize_invalid(&key("write"), "fd").unwrap_err();
        assert!(matches!(err, SynthesisError::NothingToViolate { .. }));

        let err = session
            .synthesize_invalid(&key("write"), "nosuch")
            .unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownParameter { .. }));
    }

    #[test]
    fn boundary_biased_policy_stays_in_domain() {
        let model = model();
        let mut session = Session::new(&model, Policy::boundary_biased().with_seed(30)).unwrap();
        for _ in 0..100 {
            let call = session.synthesize(&key("pickone")).unwrap();
            let n = call.arg("n").unwrap().as_int().unwrap();
            assert!((1..=8).contains(&n));
        }
    }

    #[test]
    fn parallel_sessions_share_one_model() {
        let model = std::sync::Arc::new(model());
        let mut handles = Vec::new();
        for seed in 0..4u64 {
            let model = model.clone();
            handles.push(std::thread::spawn(move || {
                let mut session =
                    Session::new(&model, Policy::uniform().with_seed(seed)).unwrap();
                session.synthesize(&OperationKey::parse("write")).unwrap()
            }));
        }
        for handle in handles {
            let call = handle.join().unwrap();
            let len = call.arg("buf").unwrap().buffer_len().unwrap();
            assert_eq!(call.arg("count").unwrap().as_int(), Some(len as i128));
        }
    }
}
