//! The operations of `SqliteApi` reachable from the JVM.

use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::registry::{LogicalType, TypeRegistry};
use crate::signature::{FunctionPair, FunctionSignature, boundary_method_name};

use crate::registry::LogicalType::{
    ByteArray, ColumnType, DbRef, Double, Int, Long, NullableByteArray, NullableString,
    ResultCode, StmtRef, Unit,
};

/// A logical operation as declared on the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiOperation {
    pub name: &'static str,
    pub params: &'static [LogicalType],
    pub ret: LogicalType,
    pub fallible: bool,
}

const fn op(
    name: &'static str,
    params: &'static [LogicalType],
    ret: LogicalType,
) -> ApiOperation {
    ApiOperation {
        name,
        params,
        ret,
        fallible: true,
    }
}

const fn infallible(
    name: &'static str,
    params: &'static [LogicalType],
    ret: LogicalType,
) -> ApiOperation {
    ApiOperation {
        name,
        params,
        ret,
        fallible: false,
    }
}

/// Every `SqliteApi` operation that gets a native method.
pub const SQLITE_API: &[ApiOperation] = &[
    op("open_connection", &[LogicalType::String], DbRef),
    op("close", &[DbRef], Unit),
    op("prepare_stmt", &[DbRef, LogicalType::String], StmtRef),
    op("step", &[StmtRef], ResultCode),
    op("reset", &[StmtRef], Unit),
    op("finalize", &[StmtRef], Unit),
    op("clear_bindings", &[StmtRef], Unit),
    op("bind_parameter_count", &[StmtRef], Int),
    op("bind_int", &[StmtRef, Int, Int], Unit),
    op("bind_long", &[StmtRef, Int, Long], Unit),
    op("bind_double", &[StmtRef, Int, Double], Unit),
    op("bind_text", &[StmtRef, Int, LogicalType::String], Unit),
    op("bind_blob", &[StmtRef, Int, ByteArray], Unit),
    op("bind_null", &[StmtRef, Int], Unit),
    op("column_count", &[StmtRef], Int),
    op("column_name", &[StmtRef, Int], NullableString),
    op("column_type", &[StmtRef, Int], ColumnType),
    op("column_is_null", &[StmtRef, Int], LogicalType::Boolean),
    op("column_int", &[StmtRef, Int], Int),
    op("column_long", &[StmtRef, Int], Long),
    op("column_double", &[StmtRef, Int], Double),
    op("column_text", &[StmtRef, Int], NullableString),
    op("column_blob", &[StmtRef, Int], NullableByteArray),
    op("error_msg", &[DbRef], NullableString),
    op("error_code", &[DbRef], ResultCode),
    infallible("error_string", &[ResultCode], NullableString),
    op("exec", &[DbRef, LogicalType::String], Unit),
    op("changes", &[DbRef], Int),
    op("last_insert_rowid", &[DbRef], Long),
    infallible("sqlite_version", &[], LogicalType::String),
];

impl ApiOperation {
    pub fn signature(&self) -> FunctionSignature<LogicalType> {
        FunctionSignature::new(self.name, self.params.to_vec(), self.ret)
    }

    pub fn to_pair(
        &self,
        config: &GeneratorConfig,
        registry: &TypeRegistry,
    ) -> Result<FunctionPair, GenError> {
        FunctionPair::derive(
            self.signature(),
            boundary_method_name(&config.method_prefix, self.name),
            self.fallible,
            registry,
        )
    }
}

/// Derive the pairs for `operations`, failing on the first unregistered type.
pub fn function_pairs(
    operations: &[ApiOperation],
    config: &GeneratorConfig,
    registry: &TypeRegistry,
) -> Result<Vec<FunctionPair>, GenError> {
    operations
        .iter()
        .map(|operation| operation.to_pair(config, registry))
        .collect()
}
