use super::Ty::*;
use super::{before, between, since, Field, ALL};
use crate::ffi::{HUGE_STR_LEN, MAX_INFO_TERMS, MAX_STR_LEN, MAX_STR_LEN2, MIN_STR_LEN, PMU_MAX};
use crate::version::v;

// `PAPI_component_info_t`, or `PAPI_substrate_info_t` before 4.0.
// The library fills these in place, so every row must match the installed
// header exactly, one missing `int` shifts all later fields.
#[rustfmt::skip]
pub const COMPONENT_INFO: [Field; 31] = [
    Field::new(ALL,                                  "name",                    Chars(MAX_STR_LEN)),
    Field::new(since(v!(5, 0)),                      "short_name",              Chars(MIN_STR_LEN)),
    Field::new(since(v!(5, 0)),                      "description",             Chars(MAX_STR_LEN)),
    Field::new(ALL,                                  "version",                 Chars(MIN_STR_LEN)),
    Field::new(ALL,                                  "support_version",         Chars(MIN_STR_LEN)),
    Field::new(ALL,                                  "kernel_version",          Chars(MIN_STR_LEN)),
    Field::new(since(v!(5, 0)),                      "disabled_reason",         Chars(MAX_STR_LEN)),
    Field::new(since(v!(5, 0)),                      "disabled",                Int),
    Field::new(since(v!(4, 0)),                      "CmpIdx",                  Int),
    Field::new(ALL,                                  "num_cntrs",               Int),
    Field::new(ALL,                                  "num_mpx_cntrs",           Int),
    Field::new(ALL,                                  "num_preset_events",       Int),
    Field::new(ALL,                                  "num_native_events",       Int),
    Field::new(ALL,                                  "default_domain",          Int),
    Field::new(ALL,                                  "available_domains",       Int),
    Field::new(ALL,                                  "default_granularity",     Int),
    Field::new(ALL,                                  "available_granularities", Int),
    Field::new(before(v!(5, 0)),                     "itimer_sig",              Int),
    Field::new(before(v!(5, 0)),                     "itimer_num",              Int),
    Field::new(before(v!(5, 0)),                     "itimer_ns",               Int),
    Field::new(before(v!(5, 0)),                     "itimer_res_ns",           Int),
    Field::new(ALL,                                  "hardware_intr_sig",       Int),
    Field::new(before(v!(5, 0)),                     "clock_ticks",             Int),
    Field::new(before(v!(5, 0)),                     "opcode_match_width",      Int),
    Field::new(since(v!(5, 0)),                      "component_type",          Int),
    Field::new(since(v!(5, 4, 1)),                   "pmu_names",               Ptrs(PMU_MAX)),
    Field::new(since(v!(5, 0)),                      "reserved",                Ints(8)),
    Field::new(between(v!(4, 1, 1), v!(5, 0)),       "os_version",              Int),
    Field::new(between(v!(4, 1, 1), v!(5, 0)),       "reserved",                Ints(1)),
    Field::new(before(v!(4, 1, 1)),                  "reserved",                Ints(2)),
    Field::new(ALL,                                  "bitfield",                UInt),
];

// `PAPI_event_info_t`. 5.0 reordered it wholesale and widened `postfix`.
#[rustfmt::skip]
pub const EVENT_INFO: [Field; 23] = [
    Field::new(since(v!(5, 0)),                      "event_code",              Int),
    Field::new(before(v!(5, 0)),                     "event_code",              UInt),
    Field::new(before(v!(5, 0)),                     "event_type",              UInt),
    Field::new(before(v!(5, 0)),                     "count",                   UInt),
    Field::new(ALL,                                  "symbol",                  Chars(HUGE_STR_LEN)),
    Field::new(ALL,                                  "short_descr",             Chars(MIN_STR_LEN)),
    Field::new(ALL,                                  "long_descr",              Chars(HUGE_STR_LEN)),
    Field::new(since(v!(5, 0)),                      "component_index",         Int),
    Field::new(since(v!(5, 0)),                      "units",                   Chars(MIN_STR_LEN)),
    Field::new(since(v!(5, 0)),                      "location",                Int),
    Field::new(since(v!(5, 0)),                      "data_type",               Int),
    Field::new(since(v!(5, 0)),                      "value_type",              Int),
    Field::new(since(v!(5, 0)),                      "timescope",               Int),
    Field::new(since(v!(5, 0)),                      "update_type",             Int),
    Field::new(since(v!(5, 0)),                      "update_freq",             Int),
    Field::new(since(v!(5, 0)),                      "count",                   UInt),
    Field::new(since(v!(5, 0)),                      "event_type",              UInt),
    Field::new(ALL,                                  "derived",                 Chars(MIN_STR_LEN)),
    Field::new(since(v!(5, 0)),                      "postfix",                 Chars(MAX_STR_LEN2)),
    Field::new(before(v!(5, 0)),                     "postfix",                 Chars(MIN_STR_LEN)),
    Field::new(ALL,                                  "code",                    Ints(MAX_INFO_TERMS)),
    Field::new(ALL,                                  "name",                    Chars(MAX_INFO_TERMS * MAX_STR_LEN2)),
    Field::new(ALL,                                  "note",                    Chars(HUGE_STR_LEN)),
];
