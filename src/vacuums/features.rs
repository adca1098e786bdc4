use bitflags::bitflags;

bitflags! {
    /// UI capabilities in Home Assistant's vacuum numbering.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VacuumEntityFeature: u32 {
        const PAUSE = 4;
        const STOP = 8;
        const RETURN_HOME = 16;
        const FAN_SPEED = 32;
        const BATTERY = 64;
        const STATUS = 128;
        const SEND_COMMAND = 256;
        const LOCATE = 512;
        const CLEAN_SPOT = 1024;
        const MAP = 2048;
        const STATE = 4096;
        const START = 8192;
    }
}

bitflags! {
    /// RoboVac-specific extras beyond the standard vacuum entity.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RoboVacEntityFeature: u32 {
        const EDGE = 1;
        const SMALL_ROOM = 2;
        const CLEANING_TIME = 4;
        const CLEANING_AREA = 8;
        const DO_NOT_DISTURB = 16;
        const AUTO_RETURN = 32;
        const CONSUMABLES = 64;
        const ROOM = 128;
        const ZONE = 256;
        const MAP = 512;
        const BOOST_IQ = 1024;
    }
}
