pub mod tracker_panel;
