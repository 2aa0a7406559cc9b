pub mod mock_gpio;
pub mod mock_registers;
