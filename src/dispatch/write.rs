use decorum_core::{Arity, Callable, DispatchError, Dynamic, MemberKind, NativeError, Segment};

use super::{call_arguments, with_receiver};
use crate::Runtime;

impl Runtime {
    pub(super) fn write_path(
        &mut self,
        receiver: Dynamic,
        path: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(value);
        };

        match (receiver, first) {
            // A one-element aggregate behaves as its single instance.
            (Dynamic::List(mut items), Segment::Field(_))
                if items.len() == 1 && items[0].is_instance() =>
            {
                let item = items.remove(0);
                let updated = self.write_path(item, path, value)?;
                Ok(Dynamic::List(vec![updated]))
            }
            (receiver, Segment::Field(member)) if receiver.receiver_instances().is_some() => {
                self.write_member(receiver, member, rest, value)
            }
            (Dynamic::Record(mut fields), Segment::Field(name)) => {
                let updated = if rest.is_empty() {
                    value
                } else {
                    let Some(current) = fields.get(name).cloned() else {
                        return Err(DispatchError::NoSuchMember {
                            type_name: "record".to_string(),
                            member: name.clone(),
                        });
                    };
                    self.dispatch_write(current, rest, value)?
                };
                fields.insert(name.clone(), updated);
                Ok(Dynamic::Record(fields))
            }
            (Dynamic::List(mut items), Segment::Index(index)) => {
                let len = items.len();
                let slot = items
                    .get_mut(*index)
                    .ok_or(DispatchError::IndexOutOfBounds { index: *index, len })?;
                let current = std::mem::take(slot);
                let updated = if rest.is_empty() {
                    value
                } else {
                    self.dispatch_write(current, rest, value)?
                };
                items[*index] = updated;
                Ok(Dynamic::List(items))
            }
            (Dynamic::Function(callable), Segment::Call(args)) => {
                let outputs = callable
                    .call(self, args.clone(), 1)
                    .map_err(|source| DispatchError::MethodFailed {
                        member: callable.name().to_string(),
                        source,
                    })?;
                self.write_into_result(callable.name(), outputs, rest, value)?;
                Ok(Dynamic::Function(callable))
            }
            (other, segment) => Err(DispatchError::InvalidAccess {
                segment: segment.to_string(),
                type_name: other.type_name(),
            }),
        }
    }

    /// Assignment to `member` of an instance receiver (or an aggregate of
    /// them, which only a method target accepts).
    fn write_member(
        &mut self,
        receiver: Dynamic,
        member: &str,
        rest: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        let (lead, count) = match receiver.receiver_instances() {
            Some(instances) => (instances[0].clone(), instances.len()),
            None => {
                return Err(DispatchError::InvalidAccess {
                    segment: Segment::field(member).to_string(),
                    type_name: receiver.type_name(),
                });
            }
        };

        if let Some(setter) = self.chain_of(&lead, MemberKind::Setter, member)? {
            tracing::trace!(member, "route: decorated setter");
            if count > 1 {
                return Err(DispatchError::MultiAssign {
                    member: member.to_string(),
                    count,
                });
            }
            return self.write_setter(receiver, setter, member, rest, value);
        }

        if let Some(method) = self.chain_of(&lead, MemberKind::Method, member)? {
            tracing::trace!(member, "route: decorated method as assignment target");
            let (args, rest) = call_arguments(rest);
            let outputs = self.call_decorated(
                &method,
                MemberKind::Method,
                member,
                with_receiver(&receiver, args),
                1,
            )?;
            self.write_into_result(member, outputs, rest, value)?;
            return Ok(receiver);
        }

        let class = self.instance(&lead)?.class().clone();
        if class.method(member).is_some() {
            tracing::trace!(member, "route: method as assignment target");
            let (args, rest) = call_arguments(rest);
            let outputs = self.call_method(&lead, member, with_receiver(&receiver, args), 1)?;
            self.write_into_result(member, outputs, rest, value)?;
            return Ok(receiver);
        }

        if class.property(member).is_none() {
            return Err(DispatchError::NoSuchMember {
                type_name: class.name().to_string(),
                member: member.to_string(),
            });
        }
        if count > 1 {
            return Err(DispatchError::MultiAssign {
                member: member.to_string(),
                count,
            });
        }

        tracing::trace!(member, "route: default property write");
        let updated = self.nested_value(&receiver, member, rest, value)?;
        self.assign_field(receiver, member, updated)
    }

    /// Write through a decorated setter: the setter runs once, with the
    /// fully computed value.
    fn write_setter(
        &mut self,
        receiver: Dynamic,
        setter: Callable,
        member: &str,
        rest: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        let updated = self.nested_value(&receiver, member, rest, value)?;
        let semantics = self.instance(&receiver)?.semantics();
        let outputs = self.call_decorated(
            &setter,
            MemberKind::Setter,
            member,
            vec![receiver.clone(), updated],
            semantics.setter_outputs(),
        )?;

        if receiver.has_reference_semantics() {
            return Ok(receiver);
        }
        outputs
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::DecoratedCallback {
                kind: MemberKind::Setter,
                member: member.to_string(),
                source: NativeError::OutputMismatch {
                    callable: setter.name().to_string(),
                    expected: Arity::Exact(1),
                    got: 0,
                },
            })
    }

    /// The value to store in `member`: `value` itself, or the current value
    /// with the nested path written into it.
    fn nested_value(
        &mut self,
        receiver: &Dynamic,
        member: &str,
        rest: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        if rest.is_empty() {
            return Ok(value);
        }
        let current = self.read_field(receiver, member)?;
        self.dispatch_write(current, rest, value)
    }

    /// Default assignment of a declared property.
    fn assign_field(
        &mut self,
        receiver: Dynamic,
        member: &str,
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        match receiver {
            Dynamic::Instance(mut instance) => {
                instance.set_field(member, value)?;
                Ok(Dynamic::Instance(instance))
            }
            receiver => {
                self.heap_instance_mut(&receiver)?.set_field(member, value)?;
                Ok(receiver)
            }
        }
    }

    /// Apply the rest of an assignment onto the first output of a call. Only
    /// heap instances can be written through. The call has already run, so
    /// its side effects stand even when the assignment is rejected.
    fn write_into_result(
        &mut self,
        member: &str,
        outputs: Vec<Dynamic>,
        rest: &[Segment],
        value: Dynamic,
    ) -> Result<(), DispatchError> {
        match outputs.into_iter().next() {
            Some(target @ Dynamic::Object(_)) if !rest.is_empty() => {
                self.dispatch_write(target, rest, value)?;
                Ok(())
            }
            _ => Err(DispatchError::AssignmentToTemporary {
                member: member.to_string(),
            }),
        }
    }
}
