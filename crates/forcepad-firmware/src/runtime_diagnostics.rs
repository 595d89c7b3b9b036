use esp_idf_svc::sys;

/// Minimum main task stack the poll loop plus Bluedroid callbacks need.
const REQUIRED_MAIN_STACK_BYTES: u32 = 8 * 1024;

/// Log heap usage statistics and current task stack headroom.
pub fn log_heap(label: &str) {
    let free_heap = unsafe { sys::esp_get_free_heap_size() };
    let min_free = unsafe { sys::esp_get_minimum_free_heap_size() };
    let largest_8bit = unsafe { sys::heap_caps_get_largest_free_block(sys::MALLOC_CAP_8BIT) };
    let stack_hwm_words = unsafe { sys::uxTaskGetStackHighWaterMark(core::ptr::null_mut()) };
    let stack_hwm_bytes = (stack_hwm_words as usize) * core::mem::size_of::<sys::StackType_t>();
    log::info!(
        "[MEM] {}: free={} min_free={} largest_8bit={} stack_hwm={}B",
        label,
        free_heap,
        min_free,
        largest_8bit,
        stack_hwm_bytes
    );
}

/// Warn when sdkconfig.defaults was not picked up by the ESP-IDF build.
pub fn check_main_stack() {
    let configured = sys::CONFIG_ESP_MAIN_TASK_STACK_SIZE;
    if configured < REQUIRED_MAIN_STACK_BYTES {
        log::warn!(
            "Main task stack too small: {} bytes (need >= {}). Check sdkconfig.defaults",
            configured,
            REQUIRED_MAIN_STACK_BYTES
        );
    } else {
        log::info!("Main task stack: {} bytes", configured);
    }
}
