//! Records sink calls into an edit log.

use crate::catalog::{Operation, REVERSED_FLAG};
use crate::config::EditLogConfig;
use crate::edit::{EditSink, GraphEdit};
use crate::error::EditResult;
use crate::log::EditLog;
use crate::object::Object;
use retrace_core::{
    AttributeId, AttributeSpec, ElementId, ElementType, GraphOperation, IndexType, TransactionId,
    Value, VertexId,
};
use std::sync::Arc;

/// An [`EditSink`] that encodes every call into an [`EditLog`].
#[derive(Debug, Default)]
pub struct EditRecorder {
    log: EditLog,
}

impl EditRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EditLogConfig) -> Self {
        Self {
            log: EditLog::with_config(config),
        }
    }

    pub fn log(&self) -> &EditLog {
        &self.log
    }

    pub fn into_log(self) -> EditLog {
        self.log
    }

    fn intern(&mut self, object: impl Into<Object>) -> EditResult<i64> {
        Ok(self.log.append_object(object.into())? as i64)
    }

    fn value_change(
        &mut self,
        operation: Operation,
        attribute: AttributeId,
        element: ElementId,
        delta: i64,
    ) -> EditResult<()> {
        self.log.record(
            operation,
            &[attribute.raw() as i64, element.raw() as i64, delta],
        )
    }

    fn update(
        &mut self,
        operation: Operation,
        attribute: AttributeId,
        old: Object,
        new: Object,
    ) -> EditResult<()> {
        let old = self.intern(old)?;
        let new = self.intern(new)?;
        self.log
            .record(operation, &[attribute.raw() as i64, old, new])
    }
}

fn endpoint_id(transaction: TransactionId, reversed: bool) -> i64 {
    let flag = if reversed { REVERSED_FLAG } else { 0 };
    (transaction.raw() | flag) as i64
}

impl EditSink for EditRecorder {
    fn set_primary_key(
        &mut self,
        element_type: ElementType,
        old_keys: &[AttributeId],
        new_keys: &[AttributeId],
    ) -> EditResult<()> {
        let old = self.intern(Object::Keys(old_keys.to_vec()))?;
        let new = self.intern(Object::Keys(new_keys.to_vec()))?;
        self.log.record(
            Operation::SetPrimaryKey,
            &[element_type.ordinal() as i64, old, new],
        )
    }

    fn add_vertex(&mut self, vertex: VertexId) -> EditResult<()> {
        self.log.record(Operation::AddVertex, &[vertex.raw() as i64])
    }

    fn remove_vertex(&mut self, vertex: VertexId) -> EditResult<()> {
        self.log
            .record(Operation::RemoveVertex, &[vertex.raw() as i64])
    }

    fn add_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    ) -> EditResult<()> {
        let operation = if directed {
            Operation::AddDirectedTransaction
        } else {
            Operation::AddUndirectedTransaction
        };
        self.log.record(
            operation,
            &[
                transaction.raw() as i64,
                destination.raw() as i64,
                source.raw() as i64,
            ],
        )
    }

    fn remove_transaction(
        &mut self,
        source: VertexId,
        destination: VertexId,
        directed: bool,
        transaction: TransactionId,
    ) -> EditResult<()> {
        let operation = if directed {
            Operation::RemoveDirectedTransaction
        } else {
            Operation::RemoveUndirectedTransaction
        };
        self.log.record(
            operation,
            &[
                transaction.raw() as i64,
                destination.raw() as i64,
                source.raw() as i64,
            ],
        )
    }

    fn set_transaction_source_vertex(
        &mut self,
        transaction: TransactionId,
        old_source: VertexId,
        new_source: VertexId,
        reversed: bool,
    ) -> EditResult<()> {
        self.log.record(
            Operation::SetTransactionSourceVertex,
            &[
                endpoint_id(transaction, reversed),
                (old_source.raw() ^ new_source.raw()) as i64,
            ],
        )
    }

    fn set_transaction_destination_vertex(
        &mut self,
        transaction: TransactionId,
        old_destination: VertexId,
        new_destination: VertexId,
        reversed: bool,
    ) -> EditResult<()> {
        self.log.record(
            Operation::SetTransactionDestinationVertex,
            &[
                endpoint_id(transaction, reversed),
                (old_destination.raw() ^ new_destination.raw()) as i64,
            ],
        )
    }

    fn add_attribute(&mut self, spec: &AttributeSpec, attribute: AttributeId) -> EditResult<()> {
        let index = self.intern(Object::Attribute(spec.clone()))?;
        self.log
            .record(Operation::AddAttribute, &[attribute.raw() as i64, index])
    }

    fn remove_attribute(
        &mut self,
        spec: &AttributeSpec,
        attribute: AttributeId,
    ) -> EditResult<()> {
        let index = self.intern(Object::Attribute(spec.clone()))?;
        self.log
            .record(Operation::RemoveAttribute, &[attribute.raw() as i64, index])
    }

    fn update_attribute_name(
        &mut self,
        attribute: AttributeId,
        old_name: &str,
        new_name: &str,
    ) -> EditResult<()> {
        self.update(
            Operation::UpdateAttributeName,
            attribute,
            Value::from(old_name).into(),
            Value::from(new_name).into(),
        )
    }

    fn update_attribute_description(
        &mut self,
        attribute: AttributeId,
        old_description: &str,
        new_description: &str,
    ) -> EditResult<()> {
        self.update(
            Operation::UpdateAttributeDescription,
            attribute,
            Value::from(old_description).into(),
            Value::from(new_description).into(),
        )
    }

    fn update_attribute_default_value(
        &mut self,
        attribute: AttributeId,
        old_default: &Value,
        new_default: &Value,
    ) -> EditResult<()> {
        self.update(
            Operation::UpdateAttributeDefaultValue,
            attribute,
            old_default.clone().into(),
            new_default.clone().into(),
        )
    }

    fn set_byte_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i8,
        new_value: i8,
    ) -> EditResult<()> {
        let delta = (old_value ^ new_value) as i64;
        self.value_change(Operation::SetByteValue, attribute, element, delta)
    }

    fn set_short_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i16,
        new_value: i16,
    ) -> EditResult<()> {
        let delta = (old_value ^ new_value) as i64;
        self.value_change(Operation::SetShortValue, attribute, element, delta)
    }

    fn set_int_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i32,
        new_value: i32,
    ) -> EditResult<()> {
        let delta = new_value.wrapping_sub(old_value) as i64;
        self.value_change(Operation::SetIntValue, attribute, element, delta)
    }

    fn set_long_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: i64,
        new_value: i64,
    ) -> EditResult<()> {
        let delta = new_value.wrapping_sub(old_value);
        self.value_change(Operation::SetLongValue, attribute, element, delta)
    }

    fn set_float_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: f32,
        new_value: f32,
    ) -> EditResult<()> {
        let delta = (old_value.to_bits() ^ new_value.to_bits()) as i32 as i64;
        self.value_change(Operation::SetFloatValue, attribute, element, delta)
    }

    fn set_double_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: f64,
        new_value: f64,
    ) -> EditResult<()> {
        let delta = (old_value.to_bits() ^ new_value.to_bits()) as i64;
        self.value_change(Operation::SetDoubleValue, attribute, element, delta)
    }

    fn set_boolean_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: bool,
        new_value: bool,
    ) -> EditResult<()> {
        if old_value == new_value {
            return Ok(());
        }
        let operation = if new_value {
            Operation::SetBooleanTrue
        } else {
            Operation::SetBooleanFalse
        };
        self.log.record(
            operation,
            &[attribute.raw() as i64, element.raw() as i64],
        )
    }

    fn set_char_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: char,
        new_value: char,
    ) -> EditResult<()> {
        let delta = (old_value as u32 ^ new_value as u32) as i64;
        self.value_change(Operation::SetCharValue, attribute, element, delta)
    }

    fn set_object_value(
        &mut self,
        attribute: AttributeId,
        element: ElementId,
        old_value: &Value,
        new_value: &Value,
    ) -> EditResult<()> {
        let attribute = attribute.raw() as i64;
        let element = element.raw() as i64;
        match (old_value.is_null(), new_value.is_null()) {
            (true, true) => Ok(()),
            (true, false) => {
                let new = self.intern(new_value.clone())?;
                self.log.record(
                    Operation::SetObjectValueFromNull,
                    &[attribute, element, new],
                )
            }
            (false, true) => {
                let old = self.intern(old_value.clone())?;
                self.log
                    .record(Operation::SetObjectValueToNull, &[attribute, element, old])
            }
            (false, false) => {
                let old = self.intern(old_value.clone())?;
                let new = self.intern(new_value.clone())?;
                self.log.record(
                    Operation::SetObjectValue,
                    &[attribute, element, old, new],
                )
            }
        }
    }

    fn set_attribute_index_type(
        &mut self,
        attribute: AttributeId,
        old_type: IndexType,
        new_type: IndexType,
    ) -> EditResult<()> {
        let delta = new_type.ordinal() as i64 - old_type.ordinal() as i64;
        self.log.record(
            Operation::SetAttributeIndexType,
            &[attribute.raw() as i64, delta],
        )
    }

    fn add_child(&mut self, child: Arc<dyn GraphEdit>) -> EditResult<()> {
        let index = self.intern(Object::Child(child))?;
        self.log.record(Operation::ExecuteChild, &[index])
    }

    fn execute_graph_operation(&mut self, operation: Arc<dyn GraphOperation>) -> EditResult<()> {
        let index = self.intern(Object::Operation(operation))?;
        self.log.record(Operation::ExecuteGraphOperation, &[index])
    }

    fn finish(&mut self) -> EditResult<()> {
        self.log.finish()
    }
}
