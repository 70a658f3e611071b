pub mod actuator_task;
pub mod baro_task;
pub mod debug_task;
pub mod fsm_task;
pub mod gps_task;
pub mod imu_task;
pub mod logger_task;
