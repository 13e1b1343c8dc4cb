mod achievements_test;
mod fights_test;
mod helpers;
mod system_test;
