// src/filter/interface.rs
// Filters over abstract targets: interfaces (with `_on`) and unions.

use super::context::{CompileContext, Fragment, Frame};
use super::relationship::{as_filter_object, label_test};
use super::{compile_object, FilterMap};
use crate::error::{FilterError, Result};
use crate::schema::{Entity, InterfaceType, UnionType};

/// Per-implementation overrides inside an interface filter
pub(crate) const ON_KEY: &str = "_on";

/// Compile a filter object against whatever `frame.variable` is bound to.
pub(crate) fn compile_entity(
    ctx: &mut CompileContext<'_>,
    entity: Entity<'_>,
    frame: &Frame,
    filter: &FilterMap,
) -> Result<Fragment> {
    match entity {
        Entity::Node(node) => compile_object(ctx, node, frame, filter),
        Entity::Interface(interface) => compile_interface(ctx, interface, frame, filter),
        Entity::Union(union) => compile_union(ctx, union, frame, filter),
    }
}

/// Without `_on` the filter is compiled once against the interface's own
/// fields and the variable is constrained to the implementations' labels.
///
/// With `_on` every implementation gets its own branch: the common keys merged
/// with its `_on` entry, which wins on conflict. When `_on` is the only key,
/// implementations it does not name are excluded, and a filter naming none of
/// them is rejected instead of matching nothing.
pub(crate) fn compile_interface(
    ctx: &mut CompileContext<'_>,
    interface: &InterfaceType,
    frame: &Frame,
    filter: &FilterMap,
) -> Result<Fragment> {
    let schema = ctx.schema;
    let implementations = schema.implementations(&interface.name);

    let on = match filter.get(ON_KEY) {
        None => {
            let labels = label_test(&frame.variable, &implementations);
            let inner = compile_object(ctx, interface, frame, filter)?;
            return Ok(Fragment::all(vec![
                labels.map(Fragment::inline).unwrap_or_default(),
                inner,
            ]));
        }
        Some(on) => as_filter_object(ON_KEY, on)?,
    };

    for name in on.keys() {
        if !implementations.iter().any(|node| node.name == *name) {
            return Err(FilterError::UnknownType(name.clone()));
        }
    }
    let common: FilterMap = filter
        .iter()
        .filter(|(key, _)| key.as_str() != ON_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut branches = Vec::new();
    for node in implementations {
        let merged = match on.get(&node.name) {
            Some(specific) => {
                let mut merged = common.clone();
                for (key, value) in as_filter_object(&node.name, specific)? {
                    merged.insert(key.clone(), value.clone());
                }
                merged
            }
            None if common.is_empty() => continue,
            None => common.clone(),
        };
        let branch_frame = ctx.descend(frame, &frame.variable, &node.name)?;
        let labels = label_test(&frame.variable, &[node]);
        let inner = compile_object(ctx, node, &branch_frame, &merged)?;
        branches.push(Fragment::all(vec![
            labels.map(Fragment::inline).unwrap_or_default(),
            inner,
        ]));
    }

    if branches.is_empty() {
        return Err(FilterError::AmbiguousInterfaceFilter {
            type_name: interface.name.clone(),
        });
    }
    Ok(Fragment::any(branches))
}

/// `{ Movie: {...}, Series: {...} }`: the variable is one of the named
/// members and satisfies that member's filter.
fn compile_union(
    ctx: &mut CompileContext<'_>,
    union: &UnionType,
    frame: &Frame,
    filter: &FilterMap,
) -> Result<Fragment> {
    let schema = ctx.schema;
    let mut branches = Vec::new();
    for (member, member_filter) in filter {
        if !union.members.contains(member) {
            return Err(FilterError::UnknownType(member.clone()));
        }
        let node = schema
            .find_node_type(member)
            .ok_or_else(|| FilterError::UnknownType(member.clone()))?;
        let member_filter = as_filter_object(member, member_filter)?;
        let branch_frame = ctx.descend(frame, &frame.variable, member)?;
        let labels = label_test(&frame.variable, &[node]);
        let inner = compile_object(ctx, node, &branch_frame, member_filter)?;
        branches.push(Fragment::all(vec![
            labels.map(Fragment::inline).unwrap_or_default(),
            inner,
        ]));
    }
    Ok(Fragment::any(branches))
}
