#![forbid(unsafe_code)]

//! Object discovery: which fields and methods each `new(...)` allocation has.
//!
//! An allocation is *named* when the enclosing frame below it is a method
//! (`Foo() { new(...) { ... } }` makes `Foo` a constructor), and *anonymous*
//! otherwise, in which case it is keyed by its node id. Named records let a
//! call `Foo()` be resolved to the object `Foo` builds.

use std::collections::{BTreeMap, HashMap};

use sable_ast::{walk, AstError, ContextStack, Node, NodeId, NodeKind, NodeTag, Transform};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKey {
    Named(String),
    Anonymous(NodeId),
}

#[derive(Clone, Debug, Default)]
pub struct ObjectRecord {
    /// Initializer names in declaration order.
    pub fields: Vec<String>,
    /// Method declarations by name.
    pub methods: BTreeMap<String, Node>,
}

#[derive(Clone, Debug, Default)]
pub struct ObjectInfo {
    named: BTreeMap<String, ObjectRecord>,
    anonymous: HashMap<NodeId, ObjectRecord>,
}

impl ObjectInfo {
    /// Walk every root with one shared result.
    pub fn gather(roots: &[&Node]) -> Result<Self, AstError> {
        let mut pass = Gather {
            ctx: ContextStack::new(),
            info: ObjectInfo::default(),
        };
        for root in roots {
            walk(&mut pass, (*root).clone())?;
        }
        Ok(pass.info)
    }

    /// Record for an allocation node or a receiver-less constructor call.
    pub fn record_of(&self, node: &Node) -> Option<&ObjectRecord> {
        match &node.kind {
            NodeKind::New { .. } => self.anonymous.get(&node.id),
            NodeKind::Call { obj, name, .. } if obj.is_nil() => self.named.get(name),
            _ => None,
        }
    }

    /// Field names of `node`, empty when it is not a known object.
    pub fn fields_of(&self, node: &Node) -> &[String] {
        self.record_of(node)
            .map(|r| r.fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn methods_of(&self, node: &Node) -> Option<&BTreeMap<String, Node>> {
        self.record_of(node).map(|r| &r.methods)
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&ObjectRecord> {
        match key {
            ObjectKey::Named(name) => self.named.get(name),
            ObjectKey::Anonymous(id) => self.anonymous.get(id),
        }
    }

    pub fn constructors(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    fn entry(&mut self, key: ObjectKey) -> &mut ObjectRecord {
        match key {
            ObjectKey::Named(name) => self.named.entry(name).or_default(),
            ObjectKey::Anonymous(id) => self.anonymous.entry(id).or_default(),
        }
    }
}

struct Gather {
    ctx: ContextStack,
    info: ObjectInfo,
}

impl Gather {
    /// Object the innermost allocation on the stack belongs to, if any.
    fn current_key(&self) -> Option<ObjectKey> {
        let top = self.ctx.top().filter(|f| f.tag == NodeTag::New)?;
        match self.ctx.below_top(1) {
            Some(frame) if frame.tag == NodeTag::Method => frame.name.clone().map(ObjectKey::Named),
            _ => Some(ObjectKey::Anonymous(top.id)),
        }
    }
}

impl Transform for Gather {
    fn context(&mut self) -> &mut ContextStack {
        &mut self.ctx
    }

    fn visit_new(&mut self, node: Node) -> Result<Node, AstError> {
        self.ctx.push(&node);
        if let (Some(key), NodeKind::New { locals, .. }) = (self.current_key(), &node.kind) {
            let fields = locals
                .iter()
                .filter_map(|l| match &l.kind {
                    NodeKind::Init { name, .. } => Some(name.clone()),
                    _ => None,
                })
                .collect();
            self.info.entry(key).fields = fields;
        }
        Ok(node)
    }

    fn visit_method(&mut self, node: Node) -> Result<Node, AstError> {
        if let (Some(key), NodeKind::Method { name, .. }) = (self.current_key(), &node.kind) {
            self.info.entry(key).methods.insert(name.clone(), node.clone());
        }
        self.ctx.push(&node);
        Ok(node)
    }
}
