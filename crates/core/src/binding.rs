use crate::Value;

/// The clause family a bound value belongs to. Flattening order for SQL
/// emission is exactly [`BindingKind::ORDER`] — no clause may read another
/// slot's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Select,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    Order,
    Union,
    UnionOrder,
}

impl BindingKind {
    pub const ORDER: [BindingKind; 9] = [
        BindingKind::Select,
        BindingKind::From,
        BindingKind::Join,
        BindingKind::Where,
        BindingKind::GroupBy,
        BindingKind::Having,
        BindingKind::Order,
        BindingKind::Union,
        BindingKind::UnionOrder,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|kind| *kind == self).expect("exhaustive ORDER")
    }
}

/// The fixed, ordered bag of binding lists a [`crate::query::QueryBuilder`]
/// accumulates while it is built. Emission flattens every slot in
/// [`BindingKind::ORDER`].
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    slots: [Vec<Value>; 9],
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: BindingKind, value: Value) {
        self.slots[kind.index()].push(value);
    }

    pub fn extend(&mut self, kind: BindingKind, values: impl IntoIterator<Item = Value>) {
        self.slots[kind.index()].extend(values);
    }

    pub fn set(&mut self, kind: BindingKind, values: Vec<Value>) {
        self.slots[kind.index()] = values;
    }

    pub fn slot(&self, kind: BindingKind) -> &[Value] {
        &self.slots[kind.index()]
    }

    pub fn slot_mut(&mut self, kind: BindingKind) -> &mut Vec<Value> {
        &mut self.slots[kind.index()]
    }

    /// Flattens every slot in clause order, producing the exact positional
    /// binding sequence that matches left-to-right `?` placeholders.
    pub fn flatten(&self) -> Vec<Value> {
        BindingKind::ORDER
            .iter()
            .flat_map(|kind| self.slots[kind.index()].iter().cloned())
            .collect()
    }

    /// Appends every slot of `other` onto the matching slot of `self`, used
    /// when merging a nested/sub builder's bindings into its parent.
    pub fn merge(&mut self, other: &Bindings) {
        for kind in BindingKind::ORDER {
            self.slots[kind.index()].extend(other.slot(kind).iter().cloned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_respects_clause_order_regardless_of_insertion_order() {
        let mut bindings = Bindings::new();
        bindings.push(BindingKind::Where, Value::Int(1));
        bindings.push(BindingKind::Select, Value::Int(2));
        bindings.push(BindingKind::Having, Value::Int(3));

        assert_eq!(
            bindings.flatten(),
            vec![Value::Int(2), Value::Int(1), Value::Int(3)]
        );
    }

    #[test]
    fn merge_appends_into_matching_slots() {
        let mut parent = Bindings::new();
        parent.push(BindingKind::Where, Value::Int(1));
        let mut nested = Bindings::new();
        nested.push(BindingKind::Where, Value::Int(2));
        nested.push(BindingKind::Select, Value::Int(3));

        parent.merge(&nested);

        assert_eq!(
            parent.flatten(),
            vec![Value::Int(3), Value::Int(1), Value::Int(2)]
        );
    }
}
