use super::{DrawOp, Lookup, ResourceGraph, ResourceKey, ResourceKind};
use crate::{GraphError, ResourceType, declaration::DrawOperation};
use slotmap::SecondaryMap;

/// Role a resource plays inside a draw operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Vertex,
    Instance,
    Global,
    Texture,
}

/// How a variable resource kind discovers the dynamic textures that consume it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DependencyRule {
    Vertex,
    Instance,
    Global,
    TextureSampled,
    /// Static textures do not invalidate the textures sampling them.
    None,
}

impl DependencyRule {
    pub(crate) fn of(ty: ResourceType) -> Option<DependencyRule> {
        match ty {
            ResourceType::Vertex => Some(DependencyRule::Vertex),
            ResourceType::Instance => Some(DependencyRule::Instance),
            ResourceType::Global => Some(DependencyRule::Global),
            ResourceType::DynamicTexture => Some(DependencyRule::TextureSampled),
            ResourceType::StaticTexture => Some(DependencyRule::None),
            ResourceType::VertexSignature
            | ResourceType::InstanceSignature
            | ResourceType::GlobalSignature
            | ResourceType::TextureSignature
            | ResourceType::Program => None,
        }
    }

    pub(crate) fn matches(self, role: Role) -> bool {
        match self {
            DependencyRule::Vertex => role == Role::Vertex,
            DependencyRule::Instance => role == Role::Instance,
            DependencyRule::Global => role == Role::Global,
            DependencyRule::TextureSampled => role == Role::Texture,
            DependencyRule::None => false,
        }
    }
}

impl DrawOp {
    /// Every variable resource the operation reads, with the role it reads it in.
    pub(crate) fn references(&self) -> impl Iterator<Item = (Role, ResourceKey)> + '_ {
        [(Role::Vertex, Some(self.vertex)), (Role::Instance, self.instance), (Role::Global, self.global)]
            .into_iter()
            .filter_map(|(role, key)| key.map(|key| (role, key)))
            .chain(self.textures.iter().map(|(_, key)| (Role::Texture, *key)))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

impl ResourceGraph {
    /// Resolve every draw operation, build both edge directions in a single scan and
    /// reject cyclic graphs.
    pub(crate) fn compute_dependencies(&mut self) -> Result<(), GraphError> {
        let textures: Vec<ResourceKey> = self
            .order
            .iter()
            .copied()
            .filter(|&key| self.type_of(key) == ResourceType::DynamicTexture)
            .collect();

        for &texture in &textures {
            let resolved = match &self.resources[texture].kind {
                ResourceKind::DynamicTexture(x) => {
                    let id = self.resources[texture].id();
                    x.declared
                        .iter()
                        .map(|op| resolve_draw_op(id, op, self.lookup()))
                        .collect::<Result<Vec<_>, _>>()?
                }
                _ => continue,
            };

            if let ResourceKind::DynamicTexture(x) = &mut self.resources[texture].kind {
                x.draw_ops = resolved;
            }
        }

        for (_, resource) in self.resources.iter_mut() {
            if let Some(state) = resource.state_mut() {
                state.depends_on.clear();
                state.dependency_of.clear();
            }
        }

        for &texture in &textures {
            let references: Vec<(Role, ResourceKey)> = match &self.resources[texture].kind {
                ResourceKind::DynamicTexture(x) => x.draw_ops.iter().flat_map(|op| op.references()).collect(),
                _ => continue,
            };

            for (role, source) in references {
                if role == Role::Texture
                    && let Some(state) = self.resources[texture].state_mut()
                {
                    push_unique(&mut state.depends_on, source);
                }

                let rule = DependencyRule::of(self.type_of(source));
                if rule.is_some_and(|rule| rule.matches(role))
                    && let Some(state) = self.resources[source].state_mut()
                {
                    push_unique(&mut state.dependency_of, texture);
                }
            }
        }

        self.check_acyclic()
    }

    /// Depth-first walk over `dependency_of` edges with in-progress marks.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut marks = SecondaryMap::new();
        for &key in &self.order {
            self.visit(key, &mut marks)?;
        }
        Ok(())
    }

    fn visit(&self, key: ResourceKey, marks: &mut SecondaryMap<ResourceKey, Mark>) -> Result<(), GraphError> {
        match marks.get(key) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                return Err(GraphError::Cycle {
                    id: self.resources[key].id().to_string(),
                });
            }
            None => {}
        }

        marks.insert(key, Mark::InProgress);
        if let Some(state) = self.resources[key].state() {
            for &next in &state.dependency_of {
                self.visit(next, marks)?;
            }
        }
        marks.insert(key, Mark::Done);

        Ok(())
    }
}

fn push_unique(list: &mut Vec<ResourceKey>, key: ResourceKey) {
    if !list.contains(&key) {
        list.push(key);
    }
}

fn resolve_draw_op(from: &str, op: &DrawOperation, lookup: Lookup<'_>) -> Result<DrawOp, GraphError> {
    let (program, prog) = lookup.expect(from, &op.program, "Program", |kind| match kind {
        ResourceKind::Program(x) => Some(x),
        _ => None,
    })?;

    let mismatch = |reason: String| GraphError::ProgramMismatch {
        from: from.to_string(),
        program: op.program.clone(),
        reason,
    };

    let (vertex, vert) = lookup.expect(from, &op.vertex, "Vertex", |kind| match kind {
        ResourceKind::Vertex(x) => Some(x),
        _ => None,
    })?;
    if vert.signature != prog.vertex_signature {
        return Err(mismatch(format!("vertex `{}` uses a different vertex signature", op.vertex)));
    }

    let instance = match (op.instance.as_deref(), prog.instance_signature) {
        (Some(target), Some(signature)) => {
            let (key, inst) = lookup.expect(from, target, "Instance", |kind| match kind {
                ResourceKind::Instance(x) => Some(x),
                _ => None,
            })?;
            if inst.signature != signature {
                return Err(mismatch(format!("instance `{}` uses a different instance signature", target)));
            }
            Some(key)
        }
        (None, None) => None,
        (Some(target), None) => {
            return Err(mismatch(format!("instance `{}` bound to a program without instance signature", target)));
        }
        (None, Some(_)) => return Err(mismatch("program expects instance data".to_string())),
    };

    let global = match (op.global.as_deref(), prog.global_signature) {
        (Some(target), Some(signature)) => {
            let (key, glob) = lookup.expect(from, target, "Global", |kind| match kind {
                ResourceKind::Global(x) => Some(x),
                _ => None,
            })?;
            if glob.signature != signature {
                return Err(mismatch(format!("global `{}` uses a different global signature", target)));
            }
            Some(key)
        }
        (None, None) => None,
        (Some(target), None) => {
            return Err(mismatch(format!("global `{}` bound to a program without global signature", target)));
        }
        (None, Some(_)) => return Err(mismatch("program expects a global uniform block".to_string())),
    };

    let mut textures = Vec::with_capacity(op.textures.len());
    for (sampler, target) in op.textures.iter() {
        if !prog.provider.samplers().any(|name| name == sampler) {
            return Err(mismatch(format!("sampler `{}` is not declared", sampler)));
        }

        let (key, _) = lookup.expect(from, target, "texture", |kind| match kind {
            ResourceKind::StaticTexture(_) | ResourceKind::DynamicTexture(_) => Some(kind),
            _ => None,
        })?;
        textures.push((sampler.to_string(), key));
    }

    Ok(DrawOp {
        program,
        vertex,
        instance,
        global,
        textures,
    })
}
