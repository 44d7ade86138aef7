pub(crate) mod board_display;
