use crate::types::{Literal, ValueType, VarId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One statement of a candidate test.
///
/// The search core only relies on a small capability set: cloning,
/// [`Action::is_side_effect_free`] and [`Action::reads_variable`]. Everything
/// else about how an action behaves is the execution engine's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Primitive {
        out: VarId,
        value: Literal,
    },
    Array {
        out: VarId,
        element: ValueType,
        elements: Vec<VarId>,
    },
    Construct {
        out: VarId,
        target: String,
        args: Vec<VarId>,
    },
    Invoke {
        out: Option<VarId>,
        target: String,
        method: String,
        receiver: Option<VarId>,
        args: Vec<VarId>,
        returns: Option<ValueType>,
    },
}

impl Action {
    /// Variable defined by this action, if any
    pub fn output(&self) -> Option<VarId> {
        match self {
            Action::Primitive { out, .. } => Some(*out),
            Action::Array { out, .. } => Some(*out),
            Action::Construct { out, .. } => Some(*out),
            Action::Invoke { out, .. } => *out,
        }
    }

    pub fn output_type(&self) -> Option<ValueType> {
        match self {
            Action::Primitive { value, .. } => Some(value.value_type()),
            Action::Array { element, .. } => Some(ValueType::Array(Box::new(element.clone()))),
            Action::Construct { target, .. } => Some(ValueType::Object(target.clone())),
            Action::Invoke { out, returns, .. } => out.and(returns.clone()),
        }
    }

    /// Primitive and array definitions have no observable effect on their own
    pub fn is_side_effect_free(&self) -> bool {
        matches!(self, Action::Primitive { .. } | Action::Array { .. })
    }

    pub fn reads_variable(&self, id: VarId) -> bool {
        self.inputs().any(|v| v == id)
    }

    /// Every variable this action reads, in order
    pub fn inputs(&self) -> Box<dyn Iterator<Item = VarId> + '_> {
        match self {
            Action::Primitive { .. } => Box::new(std::iter::empty()),
            Action::Array { elements, .. } => Box::new(elements.iter().copied()),
            Action::Construct { args, .. } => Box::new(args.iter().copied()),
            Action::Invoke { receiver, args, .. } => {
                Box::new(receiver.iter().copied().chain(args.iter().copied()))
            }
        }
    }

    /// Whether this action calls into the unit under test
    pub fn invokes(&self, unit: &str) -> bool {
        match self {
            Action::Construct { target, .. } | Action::Invoke { target, .. } => target == unit,
            _ => false,
        }
    }

    /// Rewrite every read through `map` in a single pass
    pub fn remap_inputs<F: Fn(VarId) -> VarId>(&mut self, map: F) {
        let apply = |v: &mut VarId| *v = map(*v);
        match self {
            Action::Primitive { .. } => {}
            Action::Array { elements, .. } => elements.iter_mut().for_each(apply),
            Action::Construct { args, .. } => args.iter_mut().for_each(apply),
            Action::Invoke { receiver, args, .. } => {
                receiver.iter_mut().for_each(apply);
                args.iter_mut().for_each(apply);
            }
        }
    }

    /// Replace every read of `from` with `to`
    pub fn rebind(&mut self, from: VarId, to: VarId) {
        self.remap_inputs(|v| if v == from { to } else { v });
    }

    /// Rename the defined variable
    pub fn set_output(&mut self, id: VarId) {
        match self {
            Action::Primitive { out, .. }
            | Action::Array { out, .. }
            | Action::Construct { out, .. } => *out = id,
            Action::Invoke { out, .. } => {
                if out.is_some() {
                    *out = Some(id);
                }
            }
        }
    }
}

fn join_vars(vars: &[VarId]) -> String {
    vars.iter()
        .map(|v| format!("v{}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Primitive { out, value } => {
                write!(f, "{} v{} = {};", value.value_type(), out, value)
            }
            Action::Array { out, element, elements } => {
                write!(f, "{}[] v{} = {{{}}};", element, out, join_vars(elements))
            }
            Action::Construct { out, target, args } => {
                write!(f, "{} v{} = new {}({});", target, out, target, join_vars(args))
            }
            Action::Invoke {
                out,
                target,
                method,
                receiver,
                args,
                returns,
            } => {
                if let (Some(out), Some(ty)) = (out, returns) {
                    write!(f, "{} v{} = ", ty, out)?;
                }
                match receiver {
                    Some(r) => write!(f, "v{}.{}({});", r, method, join_vars(args)),
                    None => write!(f, "{}.{}({});", target, method, join_vars(args)),
                }
            }
        }
    }
}
