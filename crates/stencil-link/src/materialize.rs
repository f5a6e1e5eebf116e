//! Turns a successful stencil into a shared script on the heap.
//!
//! Every heap call below may collect. The script shell is pushed onto the
//! root stack as soon as it exists, and each later id is stored into the
//! rooted script before the next allocating call.

use stencil_ffi::{DescriptorError, StencilDescriptor};
use stencil_gc::{Context, ScriptFlags, ScriptId, SourceExtent};

use crate::error::LinkError;
use crate::gcthings::GcThingPlan;

/// Source note meaning "no note". Fills the whole notes region.
pub const SRC_NULL: u8 = 0;

/// Padding after `code_length` bytes of code so that one leading byte, the
/// code and the notes together span a multiple of four bytes.
pub fn note_length(code_length: usize) -> usize {
    let unpadded = (code_length % 4 + 1) % 4;
    (4 - unpadded) % 4
}

/// Builds a script from `descriptor`, which must have classified as a success.
///
/// The returned id is not rooted. Root it before the next allocation.
pub fn materialize(
    cx: &mut Context,
    descriptor: &StencilDescriptor<'_>,
    source_length: usize,
) -> Result<ScriptId, LinkError> {
    let plan = GcThingPlan::for_global_script();
    let code_length = narrow("bytecode", descriptor.bytecode.len())?;
    let natoms = narrow("strings", descriptor.strings.len())?;
    let ngcthings = narrow("gcthings", plan.len())?;
    let source_length = narrow("source", source_length)?;

    let metadata = descriptor.metadata;
    let nslots = metadata
        .max_fixed_slots
        .checked_add(metadata.maximum_stack_depth)
        .ok_or_else(|| {
            LinkError::InconsistentDescriptor(format!(
                "{} fixed slots plus stack depth {} overflows",
                metadata.max_fixed_slots, metadata.maximum_stack_depth
            ))
        })?;
    if cx.link_settings().validate_stencils {
        validate(descriptor, &plan)?;
    }

    let empty_global_scope = cx.empty_global_scope();
    let flags = script_flags(descriptor, cx.options().no_result_value);

    let mut roots = cx.heap.root_scope();
    let extent = SourceExtent::for_source(source_length, metadata.lineno, metadata.column);
    let script = roots.heap_mut().alloc_script(extent)?;
    roots.push_root(script.into());
    log::debug!("Allocated script shell {:?}", script);
    let heap = roots.heap_mut();

    heap.create_private_data(script, ngcthings)?;
    log::debug!("Created private data with {} gcthings", ngcthings);

    plan.finish_into(heap, script, empty_global_scope)?;
    log::debug!("Linked gcthings to the empty global scope");

    heap.create_atom_table(script, natoms)?;
    log::debug!("Created atom table of {} entries", natoms);

    for (index, chars) in descriptor.strings.iter().enumerate() {
        let atom = heap.atomize_utf8(chars)?;
        heap.init_atom(script, index, atom)?;
    }
    log::debug!("Atomized {} strings", natoms);

    let note_length = note_length(code_length as usize);
    heap.create_immutable_data(script, code_length, note_length as u32)?;
    log::debug!(
        "Created code and notes buffer ({} + {} bytes)",
        code_length,
        note_length
    );

    {
        let data = heap.immutable_data_mut(script)?;
        data.code_mut().copy_from_slice(descriptor.bytecode);
        data.notes_mut().fill(SRC_NULL);
        data.main_offset = metadata.main_offset;
        data.nfixed = metadata.max_fixed_slots;
        data.nslots = nslots;
        data.body_scope_index = metadata.body_scope_index;
        data.num_ic_entries = metadata.num_ic_entries;
        data.num_type_sets = metadata.num_type_sets;
    }
    heap.set_script_flags(script, flags)?;
    log::debug!("Copied bytecode and metadata ({} slots)", nslots);

    heap.share_script_data(script)?;
    log::debug!("Shared script data of {:?}", script);

    Ok(script)
}

fn script_flags(descriptor: &StencilDescriptor<'_>, no_script_rval: bool) -> ScriptFlags {
    let flags = descriptor.flags;
    ScriptFlags {
        strict: flags.strict,
        bindings_accessed_dynamically: flags.bindings_accessed_dynamically,
        has_call_site_obj: flags.has_call_site_obj,
        is_for_eval: flags.is_for_eval,
        is_module: flags.is_module,
        is_function: flags.is_function,
        has_non_syntactic_scope: flags.has_non_syntactic_scope,
        needs_function_environment_objects: flags.needs_function_environment_objects,
        has_module_goal: flags.has_module_goal,
        no_script_rval,
    }
}

/// Structural checks on fields the front end derives from the bytecode.
///
/// Stack depth and the IC and type-set counts are not recomputed; that
/// needs the opcode table, which lives with the front end.
fn validate(descriptor: &StencilDescriptor<'_>, plan: &GcThingPlan) -> Result<(), LinkError> {
    let metadata = &descriptor.metadata;
    if metadata.main_offset as usize > descriptor.bytecode.len() {
        return Err(LinkError::InconsistentDescriptor(format!(
            "main offset {} is past the end of {} bytes of bytecode",
            metadata.main_offset,
            descriptor.bytecode.len()
        )));
    }
    if metadata.body_scope_index as usize >= plan.len() {
        return Err(LinkError::InconsistentDescriptor(format!(
            "body scope index {} is out of range for {} gcthings",
            metadata.body_scope_index,
            plan.len()
        )));
    }
    Ok(())
}

fn narrow(field: &'static str, value: usize) -> Result<u32, LinkError> {
    u32::try_from(value)
        .map_err(|_| LinkError::Descriptor(DescriptorError::FieldOutOfRange { field, value }))
}
