use crate::engines::generation::action::Action;
use crate::engines::generation::chromosome::Chromosome;
use crate::types::{Literal, Origin, ValueType, VarId};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Creates and edits chromosomes for one unit under test
pub trait ChromosomeFactory: Send {
    /// Name of the unit under test, as used by [`Action::invokes`]
    fn unit_name(&self) -> &str;

    fn random_chromosome(&self, rng: &mut dyn RngCore) -> Chromosome;

    /// Apply one round of mutation; returns whether anything changed
    fn mutate(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool;

    /// Insert one new call into the unit under test
    fn insert_action(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool;
}

/// A callable member of the unit under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub params: Vec<ValueType>,
    pub returns: Option<ValueType>,
    pub is_static: bool,
}

impl Operation {
    pub fn method(name: &str, params: Vec<ValueType>, returns: Option<ValueType>) -> Self {
        Self {
            name: name.to_string(),
            params,
            returns,
            is_static: false,
        }
    }

    pub fn constructor(params: Vec<ValueType>) -> Self {
        Self {
            name: "<init>".to_string(),
            params,
            returns: None,
            is_static: true,
        }
    }
}

/// Public surface of the unit under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSurface {
    pub name: String,
    pub constructors: Vec<Operation>,
    pub methods: Vec<Operation>,
}

/// Default factory: random call sequences over a [`UnitSurface`], mutated by
/// deleting, changing and inserting actions.
pub struct SurfaceFactory {
    surface: UnitSurface,
    initial_length: usize,
    max_length: usize,
    int_range: std::ops::RangeInclusive<i64>,
}

impl SurfaceFactory {
    pub fn new(surface: UnitSurface, initial_length: usize, max_length: usize) -> Self {
        Self {
            surface,
            initial_length: initial_length.max(1),
            max_length: max_length.max(1),
            int_range: -100..=100,
        }
    }

    pub fn surface(&self) -> &UnitSurface {
        &self.surface
    }

    fn unit_type(&self) -> ValueType {
        ValueType::Object(self.surface.name.clone())
    }

    fn random_literal(&self, ty: &ValueType, rng: &mut dyn RngCore) -> Option<Literal> {
        let literal = match ty {
            ValueType::Int => Literal::Int(rng.gen_range(self.int_range.clone())),
            ValueType::Float => Literal::Float(rng.gen_range(-100.0..100.0)),
            ValueType::Bool => Literal::Bool(rng.gen()),
            ValueType::Str => {
                let len = rng.gen_range(0..8);
                Literal::Str(
                    (0..len)
                        .map(|_| rng.gen_range(b'a'..=b'z') as char)
                        .collect(),
                )
            }
            ValueType::Object(_) | ValueType::Array(_) => return None,
        };
        Some(literal)
    }

    /// Obtain a variable of type `ty` at the end of `chromosome`, reusing an
    /// existing one half of the time and otherwise creating it.
    fn satisfy(
        &self,
        chromosome: &mut Chromosome,
        ty: &ValueType,
        rng: &mut dyn RngCore,
        depth: usize,
    ) -> Option<VarId> {
        let existing = chromosome.variables_of_type(ty, chromosome.size());
        if depth > 4 {
            return existing.choose(rng).copied();
        }
        if !existing.is_empty() && (rng.gen_bool(0.5) || depth > 2) {
            return existing.choose(rng).copied();
        }

        match ty {
            ValueType::Object(name) if *name == self.surface.name => {
                let ctor = self.surface.constructors.choose(rng)?.clone();
                let args = self.satisfy_all(chromosome, &ctor.params, rng, depth + 1)?;
                let out = chromosome.fresh_var();
                chromosome.push(Action::Construct {
                    out,
                    target: self.surface.name.clone(),
                    args,
                });
                Some(out)
            }
            ValueType::Object(_) => existing.choose(rng).copied(),
            ValueType::Array(element) => {
                let len = rng.gen_range(0..3);
                let mut elements = Vec::with_capacity(len);
                for _ in 0..len {
                    elements.push(self.satisfy(chromosome, element, rng, depth + 1)?);
                }
                let out = chromosome.fresh_var();
                chromosome.push(Action::Array {
                    out,
                    element: (**element).clone(),
                    elements,
                });
                Some(out)
            }
            primitive => {
                let value = self.random_literal(primitive, rng)?;
                let out = chromosome.fresh_var();
                chromosome.push(Action::Primitive { out, value });
                Some(out)
            }
        }
    }

    fn satisfy_all(
        &self,
        chromosome: &mut Chromosome,
        params: &[ValueType],
        rng: &mut dyn RngCore,
        depth: usize,
    ) -> Option<Vec<VarId>> {
        params
            .iter()
            .map(|ty| self.satisfy(chromosome, ty, rng, depth))
            .collect()
    }

    fn insert_constructor(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool {
        let Some(ctor) = self.surface.constructors.choose(rng).cloned() else {
            return false;
        };
        let Some(args) = self.satisfy_all(chromosome, &ctor.params, rng, 1) else {
            return false;
        };
        let out = chromosome.fresh_var();
        chromosome.push(Action::Construct {
            out,
            target: self.surface.name.clone(),
            args,
        });
        true
    }

    fn insert_call(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool {
        let Some(method) = self.surface.methods.choose(rng).cloned() else {
            return false;
        };
        let receiver = if method.is_static {
            None
        } else {
            match self.satisfy(chromosome, &self.unit_type(), rng, 0) {
                Some(r) => Some(r),
                None => return false,
            }
        };
        let Some(args) = self.satisfy_all(chromosome, &method.params, rng, 1) else {
            return false;
        };
        let out = method.returns.as_ref().map(|_| chromosome.fresh_var());
        chromosome.push(Action::Invoke {
            out,
            target: self.surface.name.clone(),
            method: method.name,
            receiver,
            args,
            returns: method.returns,
        });
        true
    }

    fn delete_random(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool {
        if chromosome.is_empty() {
            return false;
        }
        let position = rng.gen_range(0..chromosome.size());
        chromosome.remove(position) > 0
    }

    fn change_random(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool {
        let primitives: Vec<usize> = chromosome
            .actions()
            .iter()
            .enumerate()
            .filter(|(_, a)| matches!(a, Action::Primitive { .. }))
            .map(|(i, _)| i)
            .collect();
        let Some(&position) = primitives.choose(rng) else {
            return false;
        };

        let current = match &chromosome.actions()[position] {
            Action::Primitive { value, .. } => value.clone(),
            _ => return false,
        };
        let replacement = match &current {
            Literal::Int(v) => Literal::Int(v + rng.gen_range(-10..=10)),
            Literal::Float(v) => Literal::Float(v + rng.gen_range(-1.0..1.0)),
            Literal::Bool(v) => Literal::Bool(!v),
            Literal::Str(_) => match self.random_literal(&ValueType::Str, rng) {
                Some(lit) => lit,
                None => return false,
            },
        };
        if replacement == current {
            return false;
        }
        if let Some(Action::Primitive { value, .. }) = chromosome.action_mut(position) {
            *value = replacement;
        }
        true
    }
}

impl ChromosomeFactory for SurfaceFactory {
    fn unit_name(&self) -> &str {
        &self.surface.name
    }

    fn random_chromosome(&self, rng: &mut dyn RngCore) -> Chromosome {
        let mut chromosome = Chromosome::new(Origin::Random);
        let target = rng.gen_range(1..=self.initial_length);
        let mut attempts = 0;
        while chromosome.size() < target && attempts < target * 4 {
            self.insert_action(&mut chromosome, rng);
            attempts += 1;
        }
        chromosome.set_changed(true);
        chromosome
    }

    fn mutate(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool {
        let third = 1.0 / 3.0;
        let mut changed = false;

        if rng.gen_bool(third) {
            changed |= self.delete_random(chromosome, rng);
        }
        if rng.gen_bool(third) {
            changed |= self.change_random(chromosome, rng);
        }
        if rng.gen_bool(third) && chromosome.size() < self.max_length {
            changed |= self.insert_action(chromosome, rng);
        }

        // a no-op keeps any earlier change flag (e.g. from crossover)
        if changed {
            chromosome.set_origin(Origin::Mutated);
            chromosome.set_changed(true);
        }
        changed
    }

    fn insert_action(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool {
        let before = chromosome.actions().to_vec();
        let inserted = if self.surface.methods.is_empty() || rng.gen_bool(0.2) {
            self.insert_constructor(chromosome, rng)
        } else {
            self.insert_call(chromosome, rng)
        };

        // roll back partially satisfied parameters
        if !inserted && chromosome.size() != before.len() {
            chromosome.set_actions(before);
        }
        inserted
    }
}
