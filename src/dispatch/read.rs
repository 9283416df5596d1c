use decorum_core::{Callable, DispatchError, Dynamic, MemberKind, Segment};

use super::{call_arguments, with_receiver};
use crate::Runtime;

impl Runtime {
    pub(super) fn read_path(
        &mut self,
        receiver: &Dynamic,
        path: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        let Some((first, rest)) = path.split_first() else {
            return Ok(vec![receiver.clone()]);
        };

        if let (Segment::Field(member), Some(instances)) = (first, receiver.receiver_instances()) {
            let lead = &instances[0];
            if let Some(getter) = self.chain_of(lead, MemberKind::Getter, member)? {
                tracing::trace!(member, instances = instances.len(), "route: decorated getter");
                return self.read_getter(instances, getter, member, rest, nargout);
            }
            if let Some(method) = self.chain_of(lead, MemberKind::Method, member)? {
                tracing::trace!(member, "route: decorated method");
                let (args, rest) = call_arguments(rest);
                let wanted = if rest.is_empty() { nargout } else { 1 };
                let outputs = self.call_decorated(
                    &method,
                    MemberKind::Method,
                    member,
                    with_receiver(receiver, args),
                    wanted,
                )?;
                return self.read_rest(outputs, rest, nargout);
            }
            return self.read_member(receiver, instances, member, rest, nargout);
        }

        let outputs = self.read_step(receiver, first, rest, nargout)?;
        self.read_rest(outputs, rest, nargout)
    }

    /// Steps 2 and 3 of a read: fan-out over the first k instances, or a
    /// single intermediate value.
    fn read_getter(
        &mut self,
        instances: &[Dynamic],
        lead_chain: Callable,
        member: &str,
        rest: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        let count = instances.len();
        if !rest.is_empty() {
            if count > 1 {
                return Err(DispatchError::AmbiguousIntermediateIndex {
                    member: member.to_string(),
                    count,
                });
            }
            let outputs = self.call_decorated(
                &lead_chain,
                MemberKind::Getter,
                member,
                vec![instances[0].clone()],
                1,
            )?;
            return self.read_rest(outputs, rest, nargout);
        }

        let requested = nargout.max(1);
        if requested > count {
            return Err(DispatchError::TooManyOutputs {
                member: member.to_string(),
                requested,
                available: count,
            });
        }

        let mut values = Vec::with_capacity(requested);
        for instance in &instances[..requested] {
            let value = match self.chain_of(instance, MemberKind::Getter, member)? {
                Some(chain) => self
                    .call_decorated(&chain, MemberKind::Getter, member, vec![instance.clone()], 1)?
                    .into_iter()
                    .next()
                    .unwrap_or_default(),
                None => self.read_field(instance, member)?,
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Undecorated member of an instance or aggregate.
    fn read_member(
        &mut self,
        receiver: &Dynamic,
        instances: &[Dynamic],
        member: &str,
        rest: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        let lead = &instances[0];
        let class = self.instance(lead)?.class().clone();

        if class.property(member).is_some() {
            tracing::trace!(member, instances = instances.len(), "route: default property read");
            let count = instances.len();
            if !rest.is_empty() {
                if count > 1 {
                    return Err(DispatchError::AmbiguousIntermediateIndex {
                        member: member.to_string(),
                        count,
                    });
                }
                let value = self.read_field(lead, member)?;
                return self.dispatch_read(&value, rest, nargout);
            }
            let requested = nargout.max(1);
            if requested > count {
                return Err(DispatchError::TooManyOutputs {
                    member: member.to_string(),
                    requested,
                    available: count,
                });
            }
            return instances[..requested]
                .iter()
                .map(|instance| self.read_field(instance, member))
                .collect();
        }

        if class.method(member).is_some() {
            tracing::trace!(member, "route: default method call");
            let (args, rest) = call_arguments(rest);
            let wanted = if rest.is_empty() { nargout } else { 1 };
            let outputs = self.call_method(lead, member, with_receiver(receiver, args), wanted)?;
            return self.read_rest(outputs, rest, nargout);
        }

        Err(DispatchError::NoSuchMember {
            type_name: class.name().to_string(),
            member: member.to_string(),
        })
    }

    /// Default access for one segment on a non-instance value.
    fn read_step(
        &mut self,
        value: &Dynamic,
        segment: &Segment,
        rest: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        match (value, segment) {
            (Dynamic::Record(fields), Segment::Field(name)) => fields
                .get(name)
                .cloned()
                .map(|value| vec![value])
                .ok_or_else(|| DispatchError::NoSuchMember {
                    type_name: value.type_name().to_string(),
                    member: name.clone(),
                }),
            (Dynamic::List(items), Segment::Index(index)) => items
                .get(*index)
                .cloned()
                .map(|item| vec![item])
                .ok_or(DispatchError::IndexOutOfBounds {
                    index: *index,
                    len: items.len(),
                }),
            (Dynamic::Function(callable), Segment::Call(args)) => {
                tracing::trace!(callable = callable.name(), "route: function call");
                let wanted = if rest.is_empty() { nargout } else { 1 };
                callable
                    .call(self, args.clone(), wanted)
                    .map_err(|source| DispatchError::MethodFailed {
                        member: callable.name().to_string(),
                        source,
                    })
            }
            (other, segment) => Err(DispatchError::InvalidAccess {
                segment: segment.to_string(),
                type_name: other.type_name(),
            }),
        }
    }

    /// Dispatch `rest` onto the first of `outputs`, or return `outputs` when
    /// the path is done.
    fn read_rest(
        &mut self,
        outputs: Vec<Dynamic>,
        rest: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        if rest.is_empty() {
            return Ok(outputs);
        }
        let value = outputs.into_iter().next().unwrap_or_default();
        self.dispatch_read(&value, rest, nargout)
    }
}
