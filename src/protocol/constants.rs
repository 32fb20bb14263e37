//! TTC protocol constants used by the bind codec.
//!
//! These constants are derived from the python-oracledb thin client implementation.

// Data flags
pub const TNS_DATA_FLAGS_END_OF_REQUEST: u16 = 0x0800;
pub const TNS_DATA_FLAGS_END_OF_RESPONSE: u16 = 0x2000;

// Message types
pub const TNS_MSG_TYPE_FUNCTION: u8 = 3;
pub const TNS_MSG_TYPE_ERROR: u8 = 4;
pub const TNS_MSG_TYPE_ROW_DATA: u8 = 7;
pub const TNS_MSG_TYPE_END_OF_RESPONSE: u8 = 29;

// Function codes
pub const TNS_FUNC_EXECUTE: u8 = 94;

// Execute options
pub const TNS_EXEC_OPTION_PARSE: u32 = 0x01;
pub const TNS_EXEC_OPTION_BIND: u32 = 0x08;
pub const TNS_EXEC_OPTION_EXECUTE: u32 = 0x20;
pub const TNS_EXEC_OPTION_PLSQL_BIND: u32 = 0x400;
pub const TNS_EXEC_OPTION_NOT_PLSQL: u32 = 0x8000;

// Bind flags
pub const TNS_BIND_USE_INDICATORS: u8 = 0x01;

// Bind directions
pub const TNS_BIND_DIR_OUTPUT: u8 = 16;
pub const TNS_BIND_DIR_INPUT: u8 = 32;
pub const TNS_BIND_DIR_INPUT_OUTPUT: u8 = 48;

// Character sets
pub const TNS_CHARSET_UTF8: u16 = 873;
pub const CS_FORM_IMPLICIT: u8 = 1;

// Error numbers
pub const TNS_ERR_UNIQUE_CONSTRAINT: u32 = 1;
pub const TNS_ERR_NAME_ALREADY_USED: u32 = 955;
pub const TNS_ERR_TABLE_NOT_FOUND: u32 = 942;
pub const TNS_ERR_NOT_ENOUGH_VALUES: u32 = 947;
pub const TNS_ERR_TOO_MANY_VALUES: u32 = 913;
pub const TNS_ERR_INVALID_IDENTIFIER: u32 = 904;
pub const TNS_ERR_INCONSISTENT_DATATYPES: u32 = 932;
pub const TNS_ERR_DUPLICATE_COLUMN: u32 = 957;
pub const TNS_ERR_NOT_ALL_VARIABLES_BOUND: u32 = 1008;
pub const TNS_ERR_CANNOT_INSERT_NULL: u32 = 1400;
pub const TNS_ERR_NO_DATA_FOUND: u32 = 1403;
pub const TNS_ERR_KEY_TOO_LONG: u32 = 1450;
pub const TNS_ERR_INVALID_NUMBER: u32 = 1722;
pub const TNS_ERR_LONG_KEY: u32 = 2329;
pub const TNS_ERR_OBJECT_NOT_FOUND: u32 = 4043;
pub const TNS_ERR_NUMERIC_OR_VALUE: u32 = 6502;
pub const TNS_ERR_PLSQL_COMPILATION: u32 = 6550;
pub const TNS_ERR_VALUE_TOO_LARGE: u32 = 12899;

// Lengths
pub const TNS_LONG_LENGTH_INDICATOR: u8 = 254;
pub const TNS_NULL_LENGTH_INDICATOR: u8 = 0;
pub const TNS_CHUNK_SIZE: usize = 65536;
pub const TNS_MAX_SHORT_LENGTH: u32 = 32767;
pub const TNS_MAX_LONG_LENGTH: u32 = 0x7fffffff;
pub const TNS_MAX_UROWID_LENGTH: u32 = 5267;
pub const TNS_NUMBER_BUFFER_SIZE: u32 = 22;
pub const TNS_DATE_BUFFER_SIZE: u32 = 7;

// Oracle data type numbers
pub const ORA_TYPE_NUM_VARCHAR: u16 = 1;
pub const ORA_TYPE_NUM_NUMBER: u16 = 2;
pub const ORA_TYPE_NUM_LONG: u16 = 8;
pub const ORA_TYPE_NUM_ROWID: u16 = 11;
pub const ORA_TYPE_NUM_DATE: u16 = 12;
pub const ORA_TYPE_NUM_RAW: u16 = 23;
pub const ORA_TYPE_NUM_LONG_RAW: u16 = 24;
pub const ORA_TYPE_NUM_UROWID: u16 = 208;
